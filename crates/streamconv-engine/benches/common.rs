// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_ascii_text(repeats: usize) -> String {
    let base = "  The quick brown fox jumps over the lazy dog.\n\tPack my box with five dozen liquor jugs.  \n";
    base.repeat(repeats)
}

#[allow(dead_code)]
pub fn generate_multilingual_text(repeats: usize) -> String {
    let base = "Grüße aus Köln — Ελληνικά ΚΕΊΜΕΝΟ — 日本語のテキスト — emoji 🦀🚀 — ȺȾ widen on lowercase\n";
    base.repeat(repeats)
}
