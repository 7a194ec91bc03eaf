use std::process::ExitCode;

use clap::Parser;
use cwalarm_cloud::aws::Provisioner;
use cwalarm_config::{AlarmLayer, AwsLayer, Config, ConfigLayer, SelectionLayer};

/// Create CloudWatch CPU utilization alarms for selected EC2 instances
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Name of EC2 instances
    #[clap(short = 'n', long = "name")]
    name: Option<String>,

    /// Tag key of EC2 instances
    #[clap(short = 't', long = "tag-key")]
    tag_key: Option<String>,

    /// EC2 instance IDs: e.g. i-1234567890abcdef0,i-1234567890abcdef1
    #[clap(short = 'i', long = "instance-ids")]
    instance_ids: Option<String>,

    /// Alarm name prefix
    #[clap(short = 'a', long = "alarm-prefix")]
    alarm_prefix: Option<String>,

    /// SNS topic to notify
    #[clap(short = 's', long = "sns-topic")]
    sns_topic: Option<String>,

    /// Create alarms only for running instances
    #[clap(short = 'r', long = "running")]
    running: bool,

    /// Include instances in any state, overriding `running = true` from the config file
    #[clap(long = "no-running", conflicts_with = "running")]
    no_running: bool,

    /// EC2 action to take when alarm is triggered: Terminate, Stop, or Reboot [default: Terminate]
    #[clap(long)]
    action: Option<String>,

    /// CPU utilization threshold to trigger alarm [default: 1.0]
    #[clap(long = "thres")]
    threshold: Option<f64>,

    /// Period in seconds: 1, 5, 10, 30, or a multiple of 60 [default: 900]
    #[clap(short = 'p', long = "period", allow_negative_numbers = true)]
    period: Option<i32>,

    /// AWS region, defaults to the provider chain
    #[clap(long)]
    region: Option<String>,

    /// AWS shared config profile
    #[clap(long)]
    profile: Option<String>,

    /// Path to a TOML config file, flags take precedence over it
    #[clap(long)]
    config: Option<String>,

    /// Resolve instances and log the alarms without creating them
    #[clap(long)]
    dry_run: bool,
}

impl Cli {
    fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            selection: SelectionLayer {
                name: self.name.clone(),
                tag_key: self.tag_key.clone(),
                instance_ids: self
                    .instance_ids
                    .as_deref()
                    .map(cwalarm_config::parse_instance_ids),
                running: self.running_filter(),
            },
            alarm: AlarmLayer {
                prefix: self.alarm_prefix.clone(),
                sns_topic: self.sns_topic.clone(),
                action: self.action.clone(),
                threshold: self.threshold,
                period: self.period,
            },
            aws: AwsLayer {
                region: self.region.clone(),
                profile: self.profile.clone(),
            },
            dry_run: self.dry_run.then_some(true),
        }
    }

    fn running_filter(&self) -> Option<bool> {
        match (self.running, self.no_running) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

/// Long flags that are also accepted with a single dash, e.g. `-action=Stop`
const SINGLE_DASH_LONG_FLAGS: [&str; 2] = ["action", "thres"];

/// Rewrites `-action`, `-action=<v>`, `-thres` and `-thres=<v>` to their `--` form.
///
/// Without this clap reads them as bundled short flags (`-a ction=Stop`).
/// Arguments after a bare `--` are left alone.
fn normalize_args(args: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let mut past_separator = false;

    args.into_iter()
        .map(Into::into)
        .map(|arg: String| {
            if past_separator {
                return arg;
            }
            if arg == "--" {
                past_separator = true;
                return arg;
            }

            let is_single_dash_long = arg
                .strip_prefix('-')
                .filter(|flag| !flag.starts_with('-'))
                .is_some_and(|flag| {
                    let name = flag.split_once('=').map_or(flag, |(name, _)| name);

                    SINGLE_DASH_LONG_FLAGS.contains(&name)
                });

            if is_single_dash_long {
                format!("-{arg}")
            } else {
                arg
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse_from(normalize_args(std::env::args()));

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");

            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(cli.config.as_deref(), cli.to_layer())?;

    let provisioner = Provisioner::new(&config).await?;
    let report = provisioner.run(&config).await?;

    if report.failed() > 0 {
        log::warn!(
            "{} of {} alarm(s) could not be provisioned",
            report.failed(),
            report.outcomes.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_to_layer() {
        // Arrange
        let cli = Cli::try_parse_from([
            "cwalarm",
            "-i",
            "i-1,i-2",
            "-a",
            "idle",
            "-s",
            "MyTopic",
            "-r",
            "--action",
            "Stop",
            "--thres",
            "2.5",
            "-p",
            "300",
        ])
        .expect("Failed to parse args");

        // Act
        let layer = cli.to_layer();

        // Assert
        assert_eq!(
            layer,
            ConfigLayer {
                selection: SelectionLayer {
                    name: None,
                    tag_key: None,
                    instance_ids: Some(vec![String::from("i-1"), String::from("i-2")]),
                    running: Some(true),
                },
                alarm: AlarmLayer {
                    prefix: Some(String::from("idle")),
                    sns_topic: Some(String::from("MyTopic")),
                    action: Some(String::from("Stop")),
                    threshold: Some(2.5),
                    period: Some(300),
                },
                aws: AwsLayer::default(),
                dry_run: None,
            }
        );
    }

    #[test]
    fn test_cli_to_layer_unset_flags_do_not_override() {
        // Arrange
        let cli = Cli::try_parse_from(["cwalarm", "-n", "web"]).expect("Failed to parse args");

        // Act
        let layer = cli.to_layer();

        // Assert
        assert_eq!(layer.selection.running, None);
        assert_eq!(layer.selection.instance_ids, None);
        assert_eq!(layer.alarm, AlarmLayer::default());
        assert_eq!(layer.dry_run, None);
    }

    #[test]
    fn test_cli_to_layer_no_running() {
        // Arrange
        let cli = Cli::try_parse_from(["cwalarm", "-n", "web", "--no-running"])
            .expect("Failed to parse args");

        // Act
        let layer = cli.to_layer();

        // Assert
        assert_eq!(layer.selection.running, Some(false));
    }

    #[test]
    fn test_cli_running_conflicts_with_no_running() {
        // Act
        let result = Cli::try_parse_from(["cwalarm", "-n", "web", "-r", "--no-running"]);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_args_single_dash_action() {
        for args in [
            ["cwalarm", "-n", "web", "-action=Stop"].as_slice(),
            ["cwalarm", "-n", "web", "-action", "Stop"].as_slice(),
        ] {
            // Act
            let cli = Cli::try_parse_from(normalize_args(args.iter().copied()))
                .expect("Failed to parse args");

            // Assert
            assert_eq!(cli.action.as_deref(), Some("Stop"), "args: {args:?}");
            assert_eq!(cli.alarm_prefix, None, "args: {args:?}");
        }
    }

    #[test]
    fn test_normalize_args_single_dash_thres() {
        for args in [
            ["cwalarm", "-a", "idle", "-thres=5"].as_slice(),
            ["cwalarm", "-a", "idle", "-thres", "5"].as_slice(),
        ] {
            // Act
            let cli = Cli::try_parse_from(normalize_args(args.iter().copied()))
                .expect("Failed to parse args");

            // Assert
            assert_eq!(cli.threshold, Some(5.0), "args: {args:?}");
            assert_eq!(cli.tag_key, None, "args: {args:?}");
        }
    }

    #[test]
    fn test_normalize_args_leaves_other_args() {
        // Act
        let args = normalize_args([
            "cwalarm", "-a", "idle", "-r", "--action", "Reboot", "-p", "-60", "--", "-thres",
        ]);

        // Assert
        assert_eq!(
            args,
            vec![
                "cwalarm", "-a", "idle", "-r", "--action", "Reboot", "-p", "-60", "--", "-thres",
            ]
        );
    }
}
