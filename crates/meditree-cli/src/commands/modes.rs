use meditree_core::StaticCatalog;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let modes = StaticCatalog.all();
    if json {
        println!("{}", serde_json::to_string_pretty(&modes)?);
        return Ok(());
    }
    for info in modes {
        let pacing = if info.requires_breathing_pacing {
            "paced breathing"
        } else {
            "open"
        };
        println!(
            "{:<10} {:<10} {:<16} grows {}",
            info.mode.as_str(),
            info.title,
            pacing,
            info.species
        );
    }
    Ok(())
}
