//! Content requests
//!
//! One request cycle: join Wi-Fi, then POST the request payload to each
//! configured server in order until one of them yields a response that
//! applies cleanly. If none does, the retry schedule steps forward.

use embedded_io::Read;
use inkwake_display::{EinkDisplay, PngDecoder};
use inkwake_hal::{HttpClient, LinkStatus, WifiRadio};
use inkwake_protocol::{request_payload, Reader};

use crate::config::DeviceConfig;
use crate::lifecycle::{Board, Platform};
use crate::logging::{debug, error, info, warn};
use crate::network::NetworkSelector;
use crate::response::execute_response;
use crate::state::PersistentState;

/// Fetch new content, updating `state` either way
///
/// Returns whether some server's response was applied. Afterwards the radio
/// is powered down if the next request is far enough away that keeping the
/// association is not worth the drain.
pub fn request_content<P, D, W, H>(
    state: &mut PersistentState,
    config: &DeviceConfig,
    board: &mut Board<P, D, W, H>,
    decoder: &mut PngDecoder,
) -> bool
where
    P: Platform,
    D: EinkDisplay,
    W: WifiRadio,
    H: HttpClient,
{
    let payload = request_payload();
    NetworkSelector::new(&config.networks, &config.timing)
        .connect(&mut board.radio, &mut board.platform);

    let mut applied = false;
    for (k, &url) in config.transports.iter().enumerate() {
        if board.radio.status() != LinkStatus::Connected {
            debug!("Transport {} skipped: no Wi-Fi", k);
            continue;
        }
        if try_transport(state, config, board, decoder, url, &payload) {
            info!("Transport {} succeeded", k);
            applied = true;
            break;
        }
    }

    if !applied {
        error!("All transports failed");
        state.back_off();
    }

    if state.request_countdown_ds >= config.timing.radio_off_threshold_ds
        && board.radio.is_powered()
    {
        debug!("Next request in {} ds; powering radio off", state.request_countdown_ds);
        board.radio.power_off();
    }
    applied
}

fn try_transport<P, D, W, H>(
    state: &mut PersistentState,
    config: &DeviceConfig,
    board: &mut Board<P, D, W, H>,
    decoder: &mut PngDecoder,
    url: &str,
    payload: &[u8],
) -> bool
where
    P: Platform,
    D: EinkDisplay,
    W: WifiRadio,
    H: HttpClient,
{
    let response = match board.http.post(url, payload) {
        Ok(response) => response,
        Err(_err) => {
            warn!("Request to {} failed", url);
            // Transport errors are only Debug, which defmt cannot format
            #[cfg(not(feature = "defmt"))]
            log::debug!("{:?}", _err);
            return false;
        }
    };
    if !response.is_success() {
        warn!("Request to {} returned HTTP {}", url, response.status);
        return false;
    }
    apply_body(state, config, &mut board.display, decoder, response.body)
}

fn apply_body<D: EinkDisplay, B: Read>(
    state: &mut PersistentState,
    config: &DeviceConfig,
    display: &mut D,
    decoder: &mut PngDecoder,
    body: B,
) -> bool {
    let mut reader = Reader::new(body);
    match execute_response(state, config, display, decoder, &mut reader) {
        Ok(()) => true,
        Err(err) => {
            warn!("Response rejected: {:?}", err);
            false
        }
    }
}
