use wallhaven::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let mut builder = WallhavenBuilder::new();
    if let (Ok(username), Ok(password)) = (
        std::env::var("WALLHAVEN_USERNAME"),
        std::env::var("WALLHAVEN_PASSWORD"),
    ) {
        builder = builder.credentials(&username, &password);
    }
    let wallhaven = builder.connect().await?;

    let options = SearchOptions::new()
        .query("mountains")
        .purity(Purity::default())
        .resolutions(["1920x1080", "2560x1440"]);
    let wallpapers = wallhaven.search(&options, Some(4)).await?;

    for wallpaper in &wallpapers {
        println!("{}", wallpaper.to_json()?);
    }

    let saved = wallhaven.download(&wallpapers, None).await?;
    println!("saved: {saved:#?}");
    Ok(())
}
