#![no_main]

//! Feeds newline-separated frames into a mirror, interleaved with vote
//! clicks, and checks the selection and tally never outlive a voting phase.

use libfuzzer_sys::fuzz_target;
use undercover_client::protocol::{Phase, ServerMessage};
use undercover_client::RoomMirror;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let mut mirror = RoomMirror::new("Ann");
    for line in text.lines() {
        if let Some(target) = line.strip_prefix("click:") {
            let was_selected = mirror.selection().is_some();
            let recorded = mirror.select_vote(target);
            assert!(!(recorded && was_selected), "second vote recorded in one round");
            assert!(!(recorded && target == "Ann"), "self vote recorded");
        } else if let Ok(msg) = serde_json::from_str::<ServerMessage>(line) {
            mirror.apply(msg);
        }

        if mirror.phase() != Some(Phase::Voting) {
            assert!(mirror.selection().is_none(), "selection outside voting");
            assert!(mirror.store().tally().is_empty(), "tally outside voting");
        }
        if mirror.phase() == Some(Phase::Lobby) {
            assert!(mirror.visible_role().is_none(), "role shown in lobby");
        }
    }
});
