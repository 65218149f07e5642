// Operator subcommands: one-shot probe, start, relay control, notices
use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tabled::{Table, Tabled};

use watchdog_core::application::notices::{
    progress_message, stuck_message, FINISHED_MESSAGE, MANUAL_REBOOT_MESSAGE,
};
use watchdog_core::application::RelayController;
use watchdog_core::domain::{Fault, ProbeStatus, RelayState};
use watchdog_core::port::ProbeClient;

use crate::wiring::Components;

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Board")]
    board: String,
    #[tabled(rename = "Reachable")]
    reachable: bool,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

#[derive(Tabled)]
struct RelayRow {
    #[tabled(rename = "Relay")]
    url: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Identity")]
    identity: String,
    #[tabled(rename = "Power")]
    power: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayAction {
    Status,
    On,
    Off,
    Cycle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeAction {
    Progress(String),
    Stuck(Vec<String>),
    Reboot,
    Finish,
    Text(String),
}

impl NoticeAction {
    pub fn message(&self) -> String {
        match self {
            NoticeAction::Progress(progress) => progress_message(progress),
            NoticeAction::Stuck(words) => stuck_message(words),
            NoticeAction::Reboot => MANUAL_REBOOT_MESSAGE.to_string(),
            NoticeAction::Finish => FINISHED_MESSAGE.to_string(),
            NoticeAction::Text(message) => message.clone(),
        }
    }
}

/// Run one probe and print it; exit code 0 iff a token came back
pub async fn probe(components: &Components, json: bool) -> Result<u8> {
    let result = components.probe.check().await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to render probe result")?
        );
        return Ok(if result.is_usable() { 0 } else { 1 });
    }

    let status = match result.status() {
        ProbeStatus::Finished => "finished",
        ProbeStatus::Running(_) => "running",
        ProbeStatus::Unknown => "unknown",
    };
    let row = ProbeRow {
        board: format!(
            "{}@{}",
            components.settings.board.user, components.settings.board.host
        ),
        reachable: result.reachable,
        progress: result.progress.clone().unwrap_or_else(|| "-".to_string()),
        status,
    };
    println!("{}", Table::new(vec![row]));

    if result.is_usable() {
        println!("{}", "✓ Board answered".green().bold());
        Ok(0)
    } else {
        println!("{}", "✗ No usable progress token".red().bold());
        Ok(1)
    }
}

/// One bounded start (retries until the configured ceiling)
pub async fn start(components: &Components) -> Result<u8> {
    println!(
        "Starting experiment on {} (giving up after {}s)...",
        components.settings.board.host.bold(),
        components.config.launch.ceiling.as_secs()
    );
    match components.launcher.start().await {
        Ok(()) => {
            println!("{}", "✓ Experiment started".green().bold());
            Ok(0)
        }
        Err(e) => {
            println!("  {} {}", "✗".red(), Fault::from(e));
            Ok(1)
        }
    }
}

pub async fn relay(components: &Components, action: RelayAction) -> Result<u8> {
    let controller = components
        .relay
        .as_ref()
        .context("No relay configured (add a [relay] section or drop --no-relay)")?;
    let url = components
        .settings
        .relay
        .as_ref()
        .map(|r| r.base_url.clone())
        .unwrap_or_default();

    match action {
        RelayAction::Status => relay_status(controller, url).await,
        RelayAction::On | RelayAction::Off => {
            let on = action == RelayAction::On;
            match controller.switch_verified(on).await {
                Ok(reported) if reported == on => {
                    println!("  {} Relay reports {}", "✓".green(), power_label(reported));
                    Ok(0)
                }
                Ok(reported) => {
                    println!(
                        "  {} Requested {}, relay reports {}",
                        "✗".red(),
                        power_label(on),
                        power_label(reported)
                    );
                    Ok(1)
                }
                Err(fault) => {
                    println!("  {} {}", "✗".red(), Fault::from(fault));
                    Ok(1)
                }
            }
        }
        RelayAction::Cycle => match controller.power_cycle().await {
            Ok(()) => {
                println!("{}", "✓ Power-cycle complete".green().bold());
                Ok(0)
            }
            Err(fault) => {
                println!("  {} {}", "✗".red(), Fault::from(fault));
                Ok(1)
            }
        },
    }
}

async fn relay_status(controller: &Arc<RelayController>, url: String) -> Result<u8> {
    let Some(state) = controller.status().await else {
        println!("  {} {}", "Status:".bold(), "NO ANSWER".red());
        return Ok(1);
    };

    let identity_ok = state.matches(controller.expected_name());
    let RelayState { name, is_on } = state;
    let row = RelayRow {
        url,
        name,
        expected: controller.expected_name().to_string(),
        identity: if identity_ok {
            "ok".green().to_string()
        } else {
            "MISMATCH".red().to_string()
        },
        power: power_label(is_on).to_string(),
    };
    println!("{}", Table::new(vec![row]));
    Ok(if identity_ok { 0 } else { 1 })
}

fn power_label(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// Send one notice; a disabled notifier is not an error
pub async fn notify(components: &Components, action: NoticeAction) -> Result<u8> {
    if !components.notifier.is_enabled() {
        println!(
            "{} {} / {} not set, nothing sent",
            "⚠".yellow(),
            components.settings.notify.chat_id_env,
            components.settings.notify.token_env
        );
        return Ok(0);
    }
    components.notices().text(&action.message()).await;
    println!("{}", "✓ Notice sent".green().bold());
    Ok(0)
}

/// Print the effective configuration
pub fn show_config(components: &Components) -> Result<u8> {
    let rendered = serde_json::to_string_pretty(&components.settings)
        .context("Failed to render configuration")?;
    println!("{}", rendered);
    println!(
        "{} {}",
        "Recovery:".bold(),
        components.recovery().label().cyan()
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_action_messages() {
        assert_eq!(
            NoticeAction::Progress("[3/12]".to_string()).message(),
            "Current experiment progress [3/12]"
        );
        assert_eq!(NoticeAction::Stuck(vec![]).message(), "Power Meter is stuck!!");
        assert_eq!(
            NoticeAction::Reboot.message(),
            "Performing reboot, please re-start experiment!!"
        );
        assert_eq!(NoticeAction::Finish.message(), "Experiments finished!!");
        assert_eq!(NoticeAction::Text("hello".to_string()).message(), "hello");
    }
}
