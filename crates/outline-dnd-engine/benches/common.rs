// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_outline(items: usize, depth: usize) -> String {
    let mut content = String::from("# Outline\n\n");
    for item in 0..items {
        for level in 0..depth {
            content.push_str(&"\t".repeat(level));
            content.push_str(&format!("- Item {item} at level {level}\n"));
        }
    }
    content
}
