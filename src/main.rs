use clap::Parser;

use slice_distributer::{
    cmd_arg::CmdArgs, general::slice::BincodeSliceMaterializer, DistResult, Location,
    MemPartition, PartitionDistributer, ScpSliceDistributer,
};
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, Layer,
};

#[tokio::main]
async fn main() {
    start_tracing();
    let args = CmdArgs::parse();
    match run(&args).await {
        Ok(deployed) => println!("{}", deployed),
        Err(err) => {
            tracing::error!("distribute failed: {}", err);
            std::process::exit(1);
        }
    }
}

async fn run(args: &CmdArgs) -> DistResult<Location> {
    let config = args.distributer_config()?;
    tracing::debug!("config: {:?}", config);
    let distributer = ScpSliceDistributer::new(&config, BincodeSliceMaterializer::new())?;

    let location: Location = args.location.parse()?;
    let partition = MemPartition::load(&args.partition)?;

    let id = distributer.distribute(&location, &partition).await?;
    Ok(location.with_fragment(id))
}

pub fn start_tracing() {
    let my_filter = tracing_subscriber::filter::filter_fn(|v| {
        // if let Some(mp) = v.module_path() {
        //     if mp.contains("tokio") {
        //         return false;
        //     }
        // }
        v.level() != &tracing::Level::TRACE
    });
    let my_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let _ = tracing_subscriber::registry()
        .with(my_layer.with_filter(my_filter))
        .try_init();
}
