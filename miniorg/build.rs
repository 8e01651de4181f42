// Rebuild when migrations change so `sqlx::migrate!` embeds the latest schema.
fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
