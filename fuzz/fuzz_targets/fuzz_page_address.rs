#![no_main]

use libfuzzer_sys::fuzz_target;

use liarvote::auth::{timing_safe_eq, PageAddress};

fuzz_target!(|data: &str| {
    // Arbitrary page addresses must never panic, and stripping must remove
    // the token while leaving a parseable address behind.
    if let Ok(mut page) = PageAddress::parse(data) {
        let token = page.admin_token();
        page.strip_admin_token();
        assert!(page.admin_token().is_none());
        let _ = page.visible();

        if let Some(token) = token {
            assert!(timing_safe_eq(&token, &token));
        }
    }

    if let Some((a, b)) = data.split_once('\n') {
        assert_eq!(timing_safe_eq(a, b), a == b);
    }
});
