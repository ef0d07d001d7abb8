//! The `syntaxdrill init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("syntaxdrill.toml").exists() {
        println!("syntaxdrill.toml already exists, skipping.");
    } else {
        std::fs::write("syntaxdrill.toml", SAMPLE_CONFIG)?;
        println!("Created syntaxdrill.toml");
    }

    std::fs::create_dir_all("exercises")?;
    let example_path = std::path::Path::new("exercises/example.toml");
    if example_path.exists() {
        println!("exercises/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_EXERCISE_SET)?;
        println!("Created exercises/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point python_path in syntaxdrill.toml at your interpreter");
    println!("  2. Run: syntaxdrill validate --exercises exercises/example.toml");
    println!(
        "  3. Run: syntaxdrill render --exercises exercises/example.toml --slug string-slice --user me"
    );

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# syntaxdrill configuration

python_path = "python3"
default_timeout_ms = 5000
structural_compare = true
allow_execution = true
# "propagate" reports infrastructure failures; "fallback" grades without execution
on_execution_failure = "propagate"
environment = "development"

# Extra variables for every sandboxed run
[env]
"#;

const EXAMPLE_EXERCISE_SET: &str = r#"[exercise_set]
id = "example"
name = "Example Exercises"
description = "A small exercise set to get started"
default_language = "python"

[[exercises]]
slug = "string-slice"
title = "Slice a string"
kind = "write"
generator = "string-slice-dynamic"
prompt = "Given {{var}} = '{{word}}', write an expression for the characters from index {{start}} up to {{end}}."
expected_answer = "{{var}}[{{start}}:{{end}}]"
verification_template = """
{{var}} = '{{word}}'
print({{answer}})
"""

[exercises.target_construct]
name = "slice"
markers = [":"]
tip = "A slice reads better than indexing characters one by one."

[[exercises]]
slug = "predict-len"
title = "Predict len()"
kind = "predict"
prompt = "What does this print?"
code = """
items = [1, 2, 3]
print(len(items))
"""
expected_answer = "3"
"#;
