use std::io::Write;
use std::path::{Path, PathBuf};
use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use futures::StreamExt;
use log::{error, info};
use tracing::{info_span, Instrument};
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use websmart::{AddressClient, AddressRecord, BatchRequest, ClientConfig, ServiceResponse, WebsmartError, MAX_BATCH_RECORDS};

/// Verify postal addresses with Melissa Data WebSmart.
///
/// Reads addresses from a CSV file whose headers are the record field names
/// (`address1`, `city`, `state`, `zip`, ...) and prints one JSON line per
/// service response. The customer id comes from `WEBSMART_CUSTOMER_ID`.
#[derive(Debug, Parser)]
#[command(name = "websmart", version)]
struct Cli {
    /// CSV file with one address per row
    input: PathBuf,
    /// Look up each address on its own over the REST interface
    #[arg(long)]
    rest: bool,
    /// Maximum number of requests in flight
    #[arg(long, default_value_t = 1)]
    concurrency: usize,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(e) = color_eyre::install() {
        eprintln!("cannot install error report handler: {e:?}");
    }

    match run(Cli::parse()).await {
        Err(e) => {
            error!("Error: {:?}", e);
            std::process::exit(1);
        }
        _ => {}
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(ErrorLayer::default())
        .init();
}

async fn run(cli: Cli) -> color_eyre::Result<()> {
    let config = ClientConfig::from_env().wrap_err("cannot load configuration")?;
    let client = AddressClient::new(config)?;

    let records = load_records(&cli.input)?;
    if records.is_empty() {
        bail!("no address found in [{}]", cli.input.display());
    }
    info!("loaded [{}] addresses from [{}]", records.len(), cli.input.display());

    let results = if cli.rest {
        verify_each(&client, records, cli.concurrency).await
    } else {
        verify_in_batches(&client, records, cli.concurrency).await
    };

    let mut stdout = std::io::stdout().lock();
    let mut failures = 0;
    for (idx, result) in results {
        match result {
            Ok(response) => writeln!(stdout, "{}", serde_json::to_string(&response)?)?,
            Err(e) => {
                error!("request #{} failed: {}", idx + 1, e);
                failures += 1;
            }
        }
    }

    if failures != 0 {
        bail!("{} request(s) failed", failures);
    }
    Ok(())
}

/// submit the records in batches of at most [`MAX_BATCH_RECORDS`], results in input order
async fn verify_in_batches(
    client: &AddressClient,
    records: Vec<AddressRecord>,
    concurrency: usize,
) -> Vec<(usize, Result<ServiceResponse, WebsmartError>)> {
    let batches = records.chunks(MAX_BATCH_RECORDS)
        .map(|chunk| BatchRequest::new(chunk.to_vec()))
        .collect::<Vec<_>>();
    let total = batches.len();

    let mut results = futures::stream::iter(batches).enumerate().map(move |(idx, batch)| {
        let span = info_span!("batch", idx, records = batch.len());
        async move {
            info!("[{}/{total}] submitting batch of [{}] addresses...", idx + 1, batch.len());
            (idx, client.verify_batch(&batch).await)
        }
            .instrument(span)
    })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;
    results.sort_by_key(|(idx, _)| *idx);
    results
}

/// look up every record on its own, results in input order
async fn verify_each(
    client: &AddressClient,
    records: Vec<AddressRecord>,
    concurrency: usize,
) -> Vec<(usize, Result<ServiceResponse, WebsmartError>)> {
    let total = records.len();

    let mut results = futures::stream::iter(records).enumerate().map(move |(idx, record)| {
        let span = info_span!("lookup", idx, records = 1);
        async move {
            info!("[{}/{total}] looking up [{}]...", idx + 1, record.address1.as_deref().unwrap_or("-"));
            (idx, client.verify_single(&record).await)
        }
            .instrument(span)
    })
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;
    results.sort_by_key(|(idx, _)| *idx);
    results
}

/// read address records from a CSV file
fn load_records(path: impl AsRef<Path>) -> color_eyre::Result<Vec<AddressRecord>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path)
        .wrap_err_with(|| format!("cannot open [{}]", path.display()))?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: AddressRecord = result?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, Method::POST, MockServer};
    use websmart::{AddressField, Url};

    const RESPONSE: &str = "<ResponseArray><Version>2.0.76</Version></ResponseArray>";

    fn client_for(server: &MockServer) -> AddressClient {
        let config = ClientConfig::new("123456789")
            .with_xml_endpoint(Url::parse(&server.url("/xml")).unwrap())
            .with_rest_endpoint(Url::parse(&server.url("/rest")).unwrap());
        AddressClient::new(config).unwrap()
    }

    fn records(count: usize) -> Vec<AddressRecord> {
        (0..count)
            .map(|i| AddressRecord::new().with(AddressField::Address1, format!("{i} Main St")))
            .collect()
    }

    #[tokio::test]
    async fn batches_come_back_in_input_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/xml");
                then.status(200).body(RESPONSE);
            })
            .await;

        let results = verify_in_batches(&client_for(&server), records(MAX_BATCH_RECORDS + 1), 2).await;

        mock.assert_hits(2);
        assert_eq!(results.iter().map(|(idx, _)| *idx).collect::<Vec<_>>(), vec![0, 1]);
        assert!(results.iter().all(|(_, result)| result.is_ok()));
    }

    #[tokio::test]
    async fn lookups_come_back_in_input_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/rest");
                then.status(200).body(RESPONSE);
            })
            .await;

        let results = verify_each(&client_for(&server), records(3), 3).await;

        mock.assert_hits(3);
        assert_eq!(results.iter().map(|(idx, _)| *idx).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(results.iter().all(|(_, result)| result.is_ok()));
    }
}
