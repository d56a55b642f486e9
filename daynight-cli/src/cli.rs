use chrono::Local;
use clap::{Parser, Subcommand};
use daynight_core::{
    Companion, Config, Coordinates, FixedLocation, IpLocation, JsonLinesChannel,
    LocationProvider, ReqwestTransport, SunTimeFetcher, config::validate_coordinates,
};
use inquire::{Confirm, CustomType, Text};
use tracing::{debug, info};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "daynight", version, about = "Sunrise/sunset companion for the day-and-night watchface")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Signal "ready": locate, fetch sun times and send them to the watch on stdout.
    Run {
        /// Latitude to use instead of the configured or IP-derived location.
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,

        /// Longitude to use instead of the configured or IP-derived location.
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,
    },

    /// Configure location and lookup settings. Prompts when no flags are given.
    Configure {
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,

        /// Forget the fixed location and fall back to IP geolocation.
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        clear_location: bool,

        /// Sunrise/sunset lookup endpoint.
        #[arg(long)]
        endpoint: Option<String>,

        /// Give up on the location after this many milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Accept a cached location fix up to this many milliseconds old.
        #[arg(long)]
        maximum_age_ms: Option<u64>,
    },

    /// Print the config file location and current settings.
    Config,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Run { lat, lng } => {
                let config = Config::load()?;
                let override_coords = lat.zip(lng).map(|(lat, lng)| Coordinates::new(lat, lng));
                run_once(&config, override_coords).await?;
            }
            Command::Configure { lat, lng, clear_location, endpoint, timeout_ms, maximum_age_ms } => {
                let mut config = Config::load()?;

                let no_flags = lat.is_none()
                    && !clear_location
                    && endpoint.is_none()
                    && timeout_ms.is_none()
                    && maximum_age_ms.is_none();

                if no_flags {
                    configure_interactive(&mut config)?;
                } else {
                    if let Some((lat, lng)) = lat.zip(lng) {
                        config.set_fixed_coordinates(Coordinates::new(lat, lng))?;
                    }
                    if clear_location {
                        config.clear_fixed_coordinates();
                    }
                    if let Some(endpoint) = endpoint {
                        config.endpoint = endpoint;
                    }
                    if let Some(ms) = timeout_ms {
                        config.location_timeout_ms = ms;
                    }
                    if let Some(ms) = maximum_age_ms {
                        config.location_maximum_age_ms = ms;
                    }
                }

                config.save()?;
                info!(path = %Config::config_file_path()?.display(), "configuration saved");
            }
            Command::Config => {
                let config = Config::load()?;
                println!("# {}", Config::config_file_path()?.display());
                print!("{}", config.to_toml()?);
            }
        }

        Ok(())
    }
}

/// One invocation of the sequence. Stage failures are logged, not returned.
async fn run_once(config: &Config, override_coords: Option<Coordinates>) -> anyhow::Result<()> {
    info!("companion ready");

    let location = location_provider(config, override_coords)?;
    let fetcher = SunTimeFetcher::new(Box::new(ReqwestTransport::new()), config.endpoint.clone());
    let channel = Box::new(JsonLinesChannel::stdout());

    let companion = Companion::new(location, fetcher, channel, config.position_options());
    let report = companion.on_ready(&Local).await;
    debug!(state = ?report.state, "sequence finished");

    Ok(())
}

fn location_provider(
    config: &Config,
    override_coords: Option<Coordinates>,
) -> anyhow::Result<Box<dyn LocationProvider>> {
    if let Some(coords) = override_coords {
        validate_coordinates(&coords)?;
        return Ok(Box::new(FixedLocation::new(coords)));
    }

    Ok(match config.fixed_coordinates() {
        Some(coords) => Box::new(FixedLocation::new(coords)),
        None => {
            debug!("no fixed location configured, using IP geolocation");
            Box::new(IpLocation::new())
        }
    })
}

fn configure_interactive(config: &mut Config) -> anyhow::Result<()> {
    let fixed = Confirm::new("Use a fixed location instead of IP geolocation?")
        .with_default(config.fixed_coordinates().is_some())
        .prompt()?;

    if fixed {
        let current = config.fixed_coordinates();
        let mut lat_prompt = CustomType::<f64>::new("Latitude:");
        let mut lng_prompt = CustomType::<f64>::new("Longitude:");
        if let Some(c) = current {
            lat_prompt = lat_prompt.with_default(c.latitude);
            lng_prompt = lng_prompt.with_default(c.longitude);
        }
        let coords = Coordinates::new(lat_prompt.prompt()?, lng_prompt.prompt()?);
        config.set_fixed_coordinates(coords)?;
    } else {
        config.clear_fixed_coordinates();
    }

    config.endpoint = Text::new("Sunrise/sunset endpoint:").with_default(&config.endpoint).prompt()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["daynight", "run", "--lat", "37.7749", "--lng", "-122.4194"])
            .unwrap();
        match cli.command {
            Command::Run { lat, lng } => {
                assert_eq!(lat, Some(37.7749));
                assert_eq!(lng, Some(-122.4194));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn run_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["daynight", "run", "--lat", "37.7749"]).is_err());
    }

    #[test]
    fn clear_location_conflicts_with_coordinates() {
        let res =
            Cli::try_parse_from(["daynight", "configure", "--clear-location", "--lat", "1", "--lng", "2"]);
        assert!(res.is_err());
    }

    #[test]
    fn override_wins_over_config() {
        let mut config = Config::default();
        config.set_fixed_coordinates(Coordinates::new(1.0, 2.0)).unwrap();

        let provider = location_provider(&config, Some(Coordinates::new(3.0, 4.0))).unwrap();
        assert!(format!("{provider:?}").contains("3.0"));
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let config = Config::default();
        assert!(location_provider(&config, Some(Coordinates::new(95.0, 0.0))).is_err());
    }

    #[test]
    fn falls_back_to_ip_location() {
        let provider = location_provider(&Config::default(), None).unwrap();
        assert!(format!("{provider:?}").starts_with("IpLocation"));
    }
}
