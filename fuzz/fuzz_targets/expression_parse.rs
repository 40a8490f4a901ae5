#![no_main]

// Parsing arbitrary expression text must fail with an error, never panic.

use libfuzzer_sys::fuzz_target;
use nitf_codec_schema::Expression;

fuzz_target!(|source: &str| {
    if let Ok(expression) = Expression::parse(source) {
        assert_eq!(expression.source(), source);
        let _ = expression.field_references();
    }
});
