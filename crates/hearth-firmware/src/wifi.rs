//! WiFi station connection task
//!
//! Connects with [`RetryPolicy::WIFI`], publishes the link state (and RSSI)
//! to [`LINK`](crate::shared::LINK) and reconnects whenever the link drops.
//! When a whole round of attempts fails the task pauses for the longest
//! backoff step and starts a new round; it never gives up.

use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer, WithTimeout};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiError};
use hearth_core::config::InternetConfig;
use hearth_core::network::{LinkState, RetryPolicy};
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::shared::LINK;

/// How long DHCP may take after association
const DHCP_TIMEOUT: Duration = Duration::from_secs(15);

/// Link health poll cadence while connected
const LINK_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("WiFi driver error: {0:?}")]
    Driver(WifiError),
    #[error("no DHCP lease within {}s", DHCP_TIMEOUT.as_secs())]
    DhcpTimeout,
}

impl From<WifiError> for ConnectError {
    fn from(err: WifiError) -> Self {
        ConnectError::Driver(err)
    }
}

/// Apply station credentials to the controller.
pub fn configure(
    controller: &mut WifiController<'static>,
    credentials: &InternetConfig<'_>,
) -> Result<(), WifiError> {
    let client = ClientConfig::default()
        .with_ssid(credentials.ssid.into())
        .with_password(credentials.password.into());
    controller.set_config(&ModeConfig::Client(client))
}

#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}

#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>, stack: Stack<'static>) {
    let policy = RetryPolicy::WIFI;

    loop {
        let mut delays = policy.schedule();
        let mut attempt = 1;
        loop {
            match connect(&mut controller, stack).await {
                Ok(()) => break,
                Err(err) => {
                    warn!(
                        " WiFi attempt {}/{} failed: {}",
                        attempt, policy.max_attempts, err
                    );
                    LINK.publish(LinkState::DOWN);
                    let _ = controller.disconnect_async().await;

                    match delays.next() {
                        Some(delay) => Timer::after(delay).await,
                        None => {
                            let pause = policy.delay_for(policy.max_attempts);
                            warn!(
                                " WiFi unavailable after {} attempts, retrying in {}s",
                                policy.max_attempts,
                                pause.as_secs()
                            );
                            Timer::after(pause).await;
                            delays = policy.schedule();
                            attempt = 0;
                        }
                    }
                    attempt += 1;
                }
            }
        }

        info!(" WiFi connected, address {:?}", stack.config_v4().map(|c| c.address));
        monitor(&mut controller, stack).await;

        warn!(" WiFi link lost, reconnecting");
        LINK.publish(LinkState::DOWN);
        let _ = controller.disconnect_async().await;
    }
}

async fn connect(
    controller: &mut WifiController<'static>,
    stack: Stack<'static>,
) -> Result<(), ConnectError> {
    if !controller.is_started()? {
        controller.start_async().await?;
        debug!(" WiFi controller started");
    }
    controller.connect_async().await?;

    stack
        .wait_config_up()
        .with_timeout(DHCP_TIMEOUT)
        .await
        .map_err(|_| ConnectError::DhcpTimeout)?;

    publish(controller);
    Ok(())
}

/// Poll the link until it drops, republishing the RSSI as it changes.
async fn monitor(controller: &mut WifiController<'static>, stack: Stack<'static>) {
    loop {
        let associated = matches!(controller.is_connected(), Ok(true));
        if !(associated && stack.is_link_up() && stack.config_v4().is_some()) {
            return;
        }
        publish(controller);
        Timer::after(LINK_POLL_INTERVAL).await;
    }
}

fn publish(controller: &mut WifiController<'static>) {
    match controller.rssi() {
        Ok(rssi) => LINK.publish(LinkState::up(rssi.clamp(i8::MIN as i32, 0) as i8)),
        Err(err) => {
            debug!(" RSSI unavailable: {:?}", err);
            LINK.publish(LinkState {
                connected: true,
                rssi: None,
            });
        }
    }
}
