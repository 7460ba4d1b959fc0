#![no_main]

use libfuzzer_sys::fuzz_target;

use liarvote::voting::{Tally, Vote};

fuzz_target!(|data: &[u8]| {
    // Store responses are untrusted input: decoding and tallying must never panic.
    if let Ok(votes) = serde_json::from_slice::<Vec<Vote>>(data) {
        for vote in &votes {
            assert_eq!(vote.selected_truth(), vote.selected_liar().other());
        }
        let tally = Tally::from_votes(&votes);
        assert_eq!(tally.total(), votes.len() as u64);
        assert!(tally.success_percentage() <= 100);
    }
});
