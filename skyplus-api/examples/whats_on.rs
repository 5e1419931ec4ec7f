//! Show what the box is tuned to and print events until Ctrl-C.
//!
//! ```text
//! SKY_HOST=192.168.1.193 SKY_LOG_MODE=development cargo run --example whats_on
//! ```
//!
//! Without `SKY_HOST` the box is searched for on the network first.

use skyplus_api::logging::init_logging_from_env;
use skyplus_api::{detect, MediaInfo, SkyBox, SkyConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    let config = match SkyConfig::from_env() {
        Ok(config) => config,
        Err(_) => {
            println!("Looking for a box...");
            let device = detect(Duration::from_secs(30)).await?;
            println!("Found a box at {}", device.address);
            SkyConfig::new(device.address.to_string(), skyplus_api::config::DEFAULT_PORT)
        }
    };

    let sky = SkyBox::new(config)?;

    match sky.get_media_info().await? {
        MediaInfo::Broadcast { channel_id, .. } => {
            println!("Watching channel {}", channel_id);
            let on = sky.whats_on(channel_id).await?;
            println!(
                "Now:  {} ({} min) {}",
                on.now.title, on.now.duration_minutes, on.now.description
            );
            println!(
                "Next: {} at {}",
                on.next.title,
                on.next.start.format("%H:%M")
            );
        }
        MediaInfo::Pvr { pvr_id, .. } => println!("Playing recording {}", pvr_id),
        MediaInfo::Unknown { uri } => println!("Playing {}", uri),
    }

    let mut monitor = sky.monitor().await?;
    println!(
        "Listening for events on {} (sid {:?}); Ctrl-C to stop",
        monitor.callback_url(),
        monitor.sid()
    );

    loop {
        tokio::select! {
            event = monitor.recv() => match event {
                Some(event) => println!("Event {:?}: {}", event.sid, event.body),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    monitor.shutdown().await;
    sky.cancel_subscription().await?;
    Ok(())
}
