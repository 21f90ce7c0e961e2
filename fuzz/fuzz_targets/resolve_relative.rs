#![no_main]

use depsort_core::extract::resolve_relative;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&level, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let (current, sub_path) = text.split_once('|').unwrap_or((text, ""));
    // Qualified names never have empty segments.
    if current.split('.').any(str::is_empty) {
        return;
    }
    let sub_path = (!sub_path.is_empty()).then_some(sub_path);
    let level = usize::from(level % 8).max(1);

    if let Some(resolved) = resolve_relative(current, level, sub_path) {
        assert!(!resolved.is_empty());
        let kept = current.split('.').count().saturating_sub(level);
        assert!(resolved.split('.').count() >= kept);
    }
});
