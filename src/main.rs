use log::{debug, info};
use volresize::{
    Config, OntapClient, OutputFormat, Recommender, ReportOptions, ReportOutput, Result,
    init_logger, parse_args, prompt_password, render_text,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();

    init_logger(cli.verbose, cli.quiet)?;

    info!("Starting volume compression resize recommender");
    debug!("Cluster: {}", cli.cluster);
    debug!("Aggregate: {}", cli.aggr);

    let password = prompt_password()?;
    let config = Config::new(&cli, password)?;
    debug!("{:?}", config);

    let client = OntapClient::new(&config.connection)?;
    let recommender = Recommender::new(client, config.policy);
    let outcome = recommender
        .generate_recommendations(&config.aggregate)
        .await?;

    match config.output {
        OutputFormat::Text => {
            let options = ReportOptions {
                debug: config.debug,
                details: config.details,
            };
            print!("{}", render_text(&outcome.findings, &config.policy, &options)?);
        }
        OutputFormat::Json => {
            let output = ReportOutput::new(
                &config.cluster,
                &config.aggregate,
                config.policy,
                outcome.volumes_scanned,
                &outcome.findings,
            );
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if outcome.volumes_skipped > 0 {
        info!(
            "{} volumes skipped because of their style",
            outcome.volumes_skipped
        );
    }
    info!("Done");

    Ok(())
}
