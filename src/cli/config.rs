use eyre::Result;

use crate::config::Config;

/// Parses the config file and pretty-prints the result, defaults filled in.
pub async fn read_and_print(path: &str) -> Result<()> {
    let config = Config::load(path).await?;
    println!("{config:#?}");
    Ok(())
}
