//! `wayfinder plan <prompt>`: one request, printed to stdout.
use anyhow::{Result, bail};
use serde_json::json;
use wayfinder_config::WayfinderConfig;
use wayfinder_planner::escape::html_to_text;
use wayfinder_planner::{ChatMessage, MapOp, Sender, SessionEvent};

use crate::OutputFormat;
use crate::wiring::Services;

pub async fn run(cfg: &WayfinderConfig, prompt: &str, format: OutputFormat) -> Result<()> {
    let mut session = Services::from_config(cfg)?.session(cfg, Vec::<MapOp>::new(), Vec::<SessionEvent>::new());
    let outcome = session.submit(prompt).await;

    let events: &Vec<SessionEvent> = session.sink();
    let messages: Vec<&ChatMessage> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Message(m) => Some(m),
            _ => None,
        })
        .collect();
    for e in events {
        if let SessionEvent::Alert(text) = e {
            eprintln!("{text}");
        }
    }

    let locations = match outcome {
        Ok(locations) => locations,
        Err(e) => bail!("{e}"),
    };

    match format {
        OutputFormat::Json => {
            let doc = json!({
                "messages": messages
                    .iter()
                    .map(|m| json!({ "sender": sender_name(m.sender), "html": m.html }))
                    .collect::<Vec<_>>(),
                "markers": locations,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputFormat::Html => {
            for m in &messages {
                println!("<p class=\"{}\">{}</p>", sender_name(m.sender), m.html);
            }
        }
        OutputFormat::Text => {
            for m in &messages {
                println!("[{}]", sender_name(m.sender));
                println!("{}\n", html_to_text(&m.html));
            }
            if !locations.is_empty() {
                println!("Markers:");
                for (idx, loc) in locations.iter().enumerate() {
                    print!("{:>3}. {} ({:.5}, {:.5})", idx + 1, loc.title, loc.lat, loc.lng);
                    if loc.description.is_empty() {
                        println!();
                    } else {
                        println!(" - {}", loc.description);
                    }
                }
            }
        }
    }

    Ok(())
}

fn sender_name(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "user",
        Sender::Bot => "bot",
    }
}
