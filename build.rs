fn main() {
    println!("cargo:rerun-if-env-changed=SOLODEX_BUILD_DATE");
    println!("cargo:rerun-if-env-changed=SOLODEX_BUILD_SHA");

    let version = match (
        std::env::var("SOLODEX_BUILD_DATE").ok(),
        std::env::var("SOLODEX_BUILD_SHA").ok(),
    ) {
        (Some(date), Some(sha)) => format!("{date} ({sha})"),
        _ => "dev".to_string(),
    };

    println!("cargo:rustc-env=SOLODEX_VERSION={version}");
}
