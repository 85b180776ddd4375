use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

const KEY: &str = "AIzaSyA-cli-test-key-0123456789";

struct Sandbox {
    dir: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = dir.path().join("adforge.toml");
        let root = dir.path().display();
        std::fs::write(
            &config,
            format!(
                "[storage]\ndata_dir = '{root}/data'\nsession_dir = '{root}/session'\n\n\
                 [export]\noutput_dir = '{root}/out'\npaint_delay = \"1ms\"\nsettle_delay = \"1ms\"\n"
            ),
        )
        .expect("write config");
        Self { dir, config }
    }

    fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn run_with(&self, mock: &str, args: &[&str]) -> (Option<i32>, Value) {
        let output = Command::new(env!("CARGO_BIN_EXE_adforge"))
            .args(args)
            .arg("--config")
            .arg(&self.config)
            .env("ADFORGE_MOCK_AI", mock)
            .env_remove("GEMINI_API_KEY")
            .env_remove("VITE_GEMINI_API_KEY")
            .env_remove("RUST_LOG")
            .output()
            .expect("run adforge");
        let stdout = String::from_utf8_lossy(&output.stdout);
        let body: Value = serde_json::from_str(stdout.trim()).unwrap_or_else(|e| {
            panic!("stdout is not JSON ({e}): {stdout}")
        });
        (output.status.code(), body)
    }

    fn run(&self, args: &[&str]) -> (Option<i32>, Value) {
        self.run_with("ok", args)
    }
}

fn is_png(path: &Path) -> bool {
    std::fs::read(path)
        .map(|bytes| bytes.starts_with(b"\x89PNG"))
        .unwrap_or(false)
}

#[test]
fn generate_without_context_is_a_validation_error() {
    let sandbox = Sandbox::new();
    sandbox.run(&["key", "set", KEY]);

    let (code, body) = sandbox.run(&["generate"]);
    assert_eq!(code, Some(2));
    assert_eq!(body["mode"], "error");
    assert_eq!(body["error"]["category"], "validation");
    assert!(body["error"]["remediation"]
        .as_str()
        .unwrap()
        .contains("--context"));
}

#[test]
fn short_key_is_rejected_before_storage() {
    let sandbox = Sandbox::new();
    let (code, body) = sandbox.run(&["key", "set", "too-short"]);
    assert_eq!(code, Some(2));
    assert_eq!(body["error"]["category"], "validation");

    let (code, body) = sandbox.run(&["key", "status"]);
    assert_eq!(code, Some(0));
    assert_eq!(body["configured"], false);
}

#[test]
fn generation_without_a_key_is_a_credential_error() {
    let sandbox = Sandbox::new();
    let (code, body) = sandbox.run(&["generate", "--context", "eco coffee"]);
    assert_eq!(code, Some(2));
    assert_eq!(body["error"]["category"], "credential");
}

#[test]
fn key_status_masks_the_key() {
    let sandbox = Sandbox::new();
    let (code, body) = sandbox.run(&["key", "set", KEY, "--remember"]);
    assert_eq!(code, Some(0));
    assert_eq!(body["mode"], "key");
    assert_eq!(body["source"], "durable");
    let masked = body["maskedKey"].as_str().unwrap();
    assert_eq!(masked, "AIzaSyA-...6789");
    assert!(!body.to_string().contains(KEY));

    let (_, body) = sandbox.run(&["key", "clear"]);
    assert_eq!(body["configured"], false);
}

#[test]
fn carousel_flow_generates_edits_and_exports() {
    let sandbox = Sandbox::new();
    sandbox.run(&["key", "set", KEY]);

    let (code, body) = sandbox.run(&[
        "generate",
        "--context",
        "launch eco coffee beans",
        "--mode",
        "carousel",
        "--slides",
        "3",
    ]);
    assert_eq!(code, Some(0), "{body}");
    assert_eq!(body["mode"], "generate");
    assert_eq!(body["generation"], "carousel");
    assert_eq!(body["carousel"]["slides"].as_array().unwrap().len(), 3);

    let (code, body) = sandbox.run(&["slides", "reorder", "3", "1"]);
    assert_eq!(code, Some(0));
    assert_eq!(body["workspace"]["slides"][0]["title"], "Slide 3");

    let (code, body) = sandbox.run(&["style", "preset", "bold"]);
    assert_eq!(code, Some(0));
    assert_eq!(body["mode"], "preview");
    assert_eq!(body["applied"], false);

    let (_, body) = sandbox.run(&["style", "preset", "bold", "--yes"]);
    assert_eq!(body["applied"], true);

    let (code, body) = sandbox.run(&["export", "all", "--pixel-ratio", "0.25"]);
    assert_eq!(code, Some(0), "{body}");
    assert_eq!(body["report"]["files"].as_array().unwrap().len(), 3);
    for position in 1..=3 {
        assert!(is_png(&sandbox.out_dir().join(format!("slide-{position}.png"))));
    }

    let (_, body) = sandbox.run(&["history", "save"]);
    assert_eq!(body["action"], "saved");
    let (_, body) = sandbox.run(&["history", "save"]);
    assert_eq!(body["action"], "updated");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[test]
fn single_flow_selects_and_exports_at_the_chosen_ratio() {
    let sandbox = Sandbox::new();
    sandbox.run(&["key", "set", KEY]);

    let (code, body) = sandbox.run(&["generate", "--context", "eco coffee", "--variations", "2"]);
    assert_eq!(code, Some(0), "{body}");
    let creatives = body["creatives"].as_array().unwrap();
    assert_eq!(creatives.len(), 2);
    let second = creatives[1]["id"].as_str().unwrap().to_string();

    let (_, body) = sandbox.run(&["select", second.as_str()]);
    assert_eq!(body["workspace"]["activeId"], second.as_str());

    let (_, body) = sandbox.run(&["edit", "field", "title", "Fresh beans"]);
    assert_eq!(body["workspace"]["activeTitle"], "Fresh beans");

    sandbox.run(&["view", "--aspect-ratio", "9:16"]);
    let (code, body) = sandbox.run(&["export", "active", "--pixel-ratio", "0.25"]);
    assert_eq!(code, Some(0), "{body}");
    let name = format!("ad-creative-{second}-9x16.png");
    assert_eq!(body["report"]["files"][0]["name"], name.as_str());
    assert!(is_png(&sandbox.out_dir().join(name)));
}

#[test]
fn credential_rejection_clears_the_stored_key() {
    let sandbox = Sandbox::new();
    sandbox.run(&["key", "set", KEY, "--remember"]);

    let (code, body) =
        sandbox.run_with("credential-error", &["generate", "--context", "eco coffee"]);
    assert_eq!(code, Some(2));
    assert_eq!(body["error"]["category"], "credential");

    let (_, body) = sandbox.run(&["key", "status"]);
    assert_eq!(body["configured"], false);
}

#[test]
fn quota_rejection_keeps_the_stored_key() {
    let sandbox = Sandbox::new();
    sandbox.run(&["key", "set", KEY, "--remember"]);

    let (code, body) = sandbox.run_with("quota-error", &["generate", "--context", "eco coffee"]);
    assert_eq!(code, Some(2));
    assert_eq!(body["error"]["category"], "quota");

    let (_, body) = sandbox.run(&["key", "status"]);
    assert_eq!(body["configured"], true);
}

#[test]
fn document_input_supplies_the_context_and_assist_lists_hooks() {
    let sandbox = Sandbox::new();
    sandbox.run(&["key", "set", KEY]);
    let brief = sandbox.dir.path().join("brief.pdf");
    std::fs::write(&brief, b"%PDF-1.4 brand guide").expect("write brief");
    let brief = brief.display().to_string();

    let (code, body) =
        sandbox.run(&["generate", "--document", brief.as_str(), "--variations", "1"]);
    assert_eq!(code, Some(0), "{body}");
    assert_eq!(body["creatives"].as_array().unwrap().len(), 1);

    let (code, body) = sandbox.run(&["assist", "hooks"]);
    assert_eq!(code, Some(0), "{body}");
    assert_eq!(body["mode"], "assist");
    assert_eq!(body["task"], "hooks");
    assert_eq!(body["results"][0], "Hook 1");
}
