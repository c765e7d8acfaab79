#![no_main]

use libfuzzer_sys::fuzz_target;
use undercover_client::protocol::ServerMessage;

fuzz_target!(|data: &[u8]| {
    let Ok(msg) = serde_json::from_slice::<ServerMessage>(data) else {
        return;
    };

    // Anything we accept must survive a trip back through the encoder.
    let json = serde_json::to_string(&msg).expect("accepted frame re-encodes");
    let again: ServerMessage = serde_json::from_str(&json).expect("re-encoded frame parses");
    assert_eq!(msg, again);
});
