/// `usace_levels` binary: fetch, parse, and write the reservoir snapshot.
///
/// Configured entirely through the environment (see `config::Settings`).
/// Individual sources failing never fails the run; only an unusable
/// configuration or an unwritable output file does.

use chrono::Utc;
use std::error::Error;

use usace_levels::assemble::assemble;
use usace_levels::config::Settings;
use usace_levels::ingest::usace;
use usace_levels::logging::{self, LogSource};
use usace_levels::sources;

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let settings = Settings::from_env()?;
    logging::init_logger(settings.log_level, settings.log_file.as_deref(), false);

    let sources = match settings.sources_path.as_deref() {
        Some(path) => {
            logging::info(LogSource::Config, None, &format!("Loading sources from {}", path));
            sources::load_sources(path)?
        }
        None => sources::builtin_sources()?,
    };
    logging::info(
        LogSource::Config,
        None,
        &format!("Building snapshot for {} sources", sources.len()),
    );

    let client = usace::build_client(settings.http_timeout)?;
    let fetched = usace::fetch_all(&client, &sources);
    let snapshot = assemble(fetched, Utc::now());

    if let Err(e) = snapshot.write_to(&settings.out_path) {
        logging::error(
            LogSource::Output,
            None,
            &format!("Cannot write {}: {}", settings.out_path.display(), e),
        );
        return Err(e.into());
    }
    logging::info(
        LogSource::Output,
        None,
        &format!("Wrote {}", settings.out_path.display()),
    );

    Ok(())
}
