use eyre::Result;

use vento::cli::run;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    vento::init()?;
    vento::banner();

    run().await
}
