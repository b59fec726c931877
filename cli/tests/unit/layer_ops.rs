//! Layer operation behavior: variables-file lifecycle, output parsing,
//! destroy ordering, import idempotence, and empty-state normalization.

use std::collections::HashMap;

use groundwork_cli::domain::{CloudProvider, Layer};
use groundwork_cli::terraform::layers::{LayerOps, VARS_FILE_NAME};
use groundwork_cli::terraform::workspace::WorkspaceManager;
use tempfile::TempDir;

use crate::mocks::ScriptedRunner;

fn workspace_manager(dir: &TempDir) -> WorkspaceManager {
    WorkspaceManager::new(CloudProvider::Aws, Some(dir.path())).expect("manager")
}

fn vars() -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::new();
    map.insert("region".to_string(), "us-east-1".into());
    map
}

// ── apply ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_apply_parses_outputs() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_stdout("output", r#"{"state_bucket": {"value": "the-bucket"}}"#);

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .apply(Layer::Backend, &vars(), None, false)
        .await
        .expect("apply");

    assert!(result.success);
    assert_eq!(
        result.data["outputs"]["state_bucket"]["value"],
        "the-bucket"
    );
}

#[tokio::test]
async fn test_apply_passes_var_file_and_auto_approve() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    ops.apply(Layer::Backend, &vars(), None, false)
        .await
        .expect("apply");

    let applies = runner.calls_with_key("apply");
    assert_eq!(applies.len(), 1);
    assert_eq!(
        applies[0].args,
        vec!["apply", "-auto-approve", "-var-file", VARS_FILE_NAME]
    );
    assert!(!applies[0].capture, "apply streams output");
}

#[tokio::test]
async fn test_apply_writes_vars_before_and_removes_after() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    ops.apply(Layer::Backend, &vars(), None, false)
        .await
        .expect("apply");

    let applies = runner.calls_with_key("apply");
    assert!(applies[0].vars_present, "vars file exists during apply");
    let workspace = manager.workspace_path(Layer::Backend);
    assert!(
        !workspace.join(VARS_FILE_NAME).exists(),
        "vars file removed after the operation"
    );
}

#[tokio::test]
async fn test_apply_failure_keeps_no_vars_file_and_skips_outputs() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_failure("apply", "Error: something went wrong");

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .apply(Layer::Backend, &vars(), None, false)
        .await
        .expect("apply returns a failed result");

    assert!(!result.success);
    assert!(result.message.contains("Failed to apply backend"));
    assert!(runner.calls_with_key("output").is_empty());
    let workspace = manager.workspace_path(Layer::Backend);
    assert!(!workspace.join(VARS_FILE_NAME).exists());
}

#[tokio::test]
async fn test_apply_unparseable_outputs_degrade_to_empty_map() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_stdout("output", "not json at all");

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .apply(Layer::Backend, &vars(), None, false)
        .await
        .expect("apply");

    assert!(result.success, "apply already succeeded; bad outputs are not fatal");
    assert_eq!(result.data["outputs"], serde_json::json!({}));
}

// ── destroy ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_destroy_lists_state_before_destroying() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_stdout(
        "state list",
        "aws_s3_bucket.tf_state\naws_dynamodb_table.tf_locks[0]\n",
    );

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .destroy(Layer::Backend, &vars(), None, false)
        .await
        .expect("destroy");

    assert!(result.success);
    assert_eq!(
        result.destroyed_resources(),
        vec!["aws_s3_bucket.tf_state", "aws_dynamodb_table.tf_locks[0]"]
    );

    let list_index = runner.first_index("state list").expect("state list ran");
    let destroy_index = runner.first_index("destroy").expect("destroy ran");
    assert!(
        list_index < destroy_index,
        "state must be captured before the resources are gone"
    );
}

#[tokio::test]
async fn test_destroy_failure_returns_failed_result() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_failure("destroy", "Error: lock acquisition failed");

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .destroy(Layer::Backend, &vars(), None, false)
        .await
        .expect("destroy returns a failed result");

    assert!(!result.success);
    assert!(result.message.contains("Failed to destroy backend"));
}

// ── import ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_import_success() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .import(
            Layer::Iam,
            "aws_iam_role.admin",
            "groundwork-admin",
            &vars(),
            None,
        )
        .await
        .expect("import");

    assert!(result.success);
    let imports = runner.calls_with_key("import");
    assert_eq!(imports.len(), 1);
    assert_eq!(
        imports[0].args,
        vec![
            "import",
            "-var-file",
            VARS_FILE_NAME,
            "aws_iam_role.admin",
            "groundwork-admin"
        ]
    );
}

#[tokio::test]
async fn test_import_already_in_state_is_success_without_retry() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_failure(
        "import",
        "Error: Resource already managed by Terraform\n\
         The resource aws_iam_role.admin is already in state.",
    );

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .import(
            Layer::Iam,
            "aws_iam_role.admin",
            "groundwork-admin",
            &vars(),
            None,
        )
        .await
        .expect("import");

    assert!(result.success, "already-in-state import is a no-op success");
    assert_eq!(
        runner.calls_with_key("import").len(),
        1,
        "no second import attempt"
    );
}

#[tokio::test]
async fn test_import_other_failure_stays_failed() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_failure("import", "Error: resource does not exist in AWS");

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let result = ops
        .import(
            Layer::Iam,
            "aws_iam_role.admin",
            "groundwork-admin",
            &vars(),
            None,
        )
        .await
        .expect("import returns a failed result");

    assert!(!result.success);
}

// ── list_state ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_state_returns_addresses_in_order() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_stdout(
        "state list",
        "aws_iam_role.admin\naws_iam_role_policy_attachment.managed[\"a\"]\n",
    );

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let state = ops
        .list_state(Layer::Iam, None, false)
        .await
        .expect("list_state");

    assert_eq!(
        state,
        vec![
            "aws_iam_role.admin",
            "aws_iam_role_policy_attachment.managed[\"a\"]"
        ]
    );
}

#[tokio::test]
async fn test_list_state_no_resources_message_is_empty_list() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_failure("state list", "No resources found in the state.");

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let state = ops
        .list_state(Layer::Iam, None, false)
        .await
        .expect("empty state is not an error");
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_list_state_blank_output_is_empty_list() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_stdout("state list", "   \n");

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let state = ops
        .list_state(Layer::Iam, None, false)
        .await
        .expect("list_state");
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_list_state_real_failure_is_an_error() {
    let dir = TempDir::new().expect("tempdir");
    let manager = workspace_manager(&dir);
    let runner = ScriptedRunner::new();
    runner.enqueue_failure("state list", "Error: error acquiring the state lock");

    let ops = LayerOps::new(&runner, &manager, HashMap::new());
    let err = ops
        .list_state(Layer::Iam, None, false)
        .await
        .expect_err("lock failures must not read as an empty state");
    assert!(err.to_string().contains("state list failed"));
}
