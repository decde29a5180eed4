use std::path::Path;

fn main() {
    let aliases_path = Path::new("aliases/chromosome_aliases.json");
    validate_alias_file(aliases_path);
    set_build_dependencies();
}

fn validate_alias_file(aliases_path: &Path) {
    // Ensure alias table exists at build time
    assert!(
        aliases_path.exists(),
        "\n\nALIAS TABLE BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the alias table before building.\n",
        aliases_path.display()
    );

    let contents = std::fs::read_to_string(aliases_path).unwrap_or_else(|e| {
        panic!(
            "\n\nALIAS TABLE BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            aliases_path.display()
        );
    });

    let table: serde_json::Value = serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\nALIAS TABLE BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            aliases_path.display()
        );
    });

    validate_table_structure(&table);
}

fn validate_table_structure(table: &serde_json::Value) {
    assert!(
        table.is_object(),
        "\n\nALIAS TABLE BUILD ERROR: Root must be a JSON object\n\
         Got: {table}\n"
    );

    let builds = table
        .get("builds")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!(
                "\n\nALIAS TABLE BUILD ERROR: Missing 'builds' array\n\
                 The table must have a top-level 'builds' array.\n"
            );
        });

    let synonyms = table
        .get("mitochondrial_synonyms")
        .and_then(serde_json::Value::as_array)
        .unwrap_or_else(|| {
            panic!("\n\nALIAS TABLE BUILD ERROR: Missing 'mitochondrial_synonyms' array\n");
        });
    assert!(
        !synonyms.is_empty(),
        "\n\nALIAS TABLE BUILD ERROR: 'mitochondrial_synonyms' must not be empty\n"
    );

    let mut total_names = 0;
    for (i, build) in builds.iter().enumerate() {
        total_names += validate_build(build, i);
    }

    println!(
        "cargo:warning=Validated alias table: {} builds, {total_names} chromosome names",
        builds.len()
    );
}

fn validate_build(build: &serde_json::Value, index: usize) -> usize {
    let name = build
        .get("build")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_else(|| {
            panic!("\n\nALIAS TABLE BUILD ERROR: Build at index {index} missing 'build' field\n");
        });

    assert!(
        matches!(name, "GRCh37" | "GRCh38"),
        "\n\nALIAS TABLE BUILD ERROR: Unknown build '{name}' (index {index})\n"
    );

    let chromosomes = build
        .get("chromosomes")
        .and_then(serde_json::Value::as_object)
        .unwrap_or_else(|| {
            panic!("\n\nALIAS TABLE BUILD ERROR: Build '{name}' missing 'chromosomes' object\n");
        });

    for (chrom, accession) in chromosomes {
        let accession = accession.as_str().unwrap_or_else(|| {
            panic!(
                "\n\nALIAS TABLE BUILD ERROR: Build '{name}' chromosome '{chrom}' must map to a string\n"
            );
        });
        assert!(
            accession.starts_with("NC_") && accession.contains('.'),
            "\n\nALIAS TABLE BUILD ERROR: Build '{name}' chromosome '{chrom}' maps to \
             '{accession}', expected a versioned RefSeq accession\n"
        );
    }

    chromosomes.len()
}

fn set_build_dependencies() {
    // Tell cargo to rerun if the alias table changes
    println!("cargo:rerun-if-changed=aliases/chromosome_aliases.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
