use std::fs;
use std::path::Path;

use tempfile::TempDir;

use vaxtrack_cli::{RunArgs, run};
use vaxtrack_infra::{InsufficientInventoryPolicy, ReplayReport, RunConfig};

const SEED: &str = "\
1,1,1,1
1,2021-01-01,1,10
1,SupplierA,1
1,ClinicX,20,1
1,L1,0,0
";

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn args(dir: &TempDir, orders: &str, policy: InsufficientInventoryPolicy) -> RunArgs {
    RunArgs {
        seed_path: write(dir.path(), "seed.txt", SEED),
        orders_path: write(dir.path(), "orders.txt", orders),
        output_path: dir.path().join("output.txt"),
        config: RunConfig {
            database_url: format!("sqlite://{}", dir.path().join("database.db").display()),
            insufficient_inventory: policy,
        },
    }
}

#[tokio::test]
async fn receive_then_send_writes_two_summary_lines() {
    let dir = TempDir::new().unwrap();
    let args = args(
        &dir,
        "SupplierA,5,2021-02-01\nClinicX,8\n",
        InsufficientInventoryPolicy::Halt,
    );

    let report = run(&args).await.unwrap();

    assert_eq!(report, ReplayReport { processed: 2, skipped: 0 });
    assert_eq!(
        fs::read_to_string(&args.output_path).unwrap(),
        "15,20,5,0\n7,12,5,8\n"
    );
    assert!(dir.path().join("database.db").exists());
}

#[tokio::test]
async fn each_run_starts_from_the_seed() {
    let dir = TempDir::new().unwrap();
    let args = args(&dir, "ClinicX,4\n", InsufficientInventoryPolicy::Halt);

    run(&args).await.unwrap();
    run(&args).await.unwrap();

    assert_eq!(fs::read_to_string(&args.output_path).unwrap(), "6,16,0,4\n");
}

#[tokio::test]
async fn fatal_error_keeps_earlier_lines() {
    let dir = TempDir::new().unwrap();
    let args = args(
        &dir,
        "ClinicX,4\nUnknownClinic,1\nClinicX,1\n",
        InsufficientInventoryPolicy::Halt,
    );

    let err = run(&args).await.unwrap_err();

    assert!(format!("{err:#}").contains("clinic not found"), "{err:#}");
    assert_eq!(fs::read_to_string(&args.output_path).unwrap(), "6,16,0,4\n");
}

#[tokio::test]
async fn skip_policy_continues_past_oversized_sends() {
    let dir = TempDir::new().unwrap();
    let args = args(
        &dir,
        "ClinicX,50\nClinicX,10\n",
        InsufficientInventoryPolicy::Skip,
    );

    let report = run(&args).await.unwrap();

    assert_eq!(report, ReplayReport { processed: 1, skipped: 1 });
    assert_eq!(fs::read_to_string(&args.output_path).unwrap(), "0,10,0,10\n");
}

#[tokio::test]
async fn inconsistent_seed_fails_before_any_output() {
    let dir = TempDir::new().unwrap();
    let mut args = args(&dir, "ClinicX,1\n", InsufficientInventoryPolicy::Halt);
    args.seed_path = write(dir.path(), "bad-seed.txt", "0,1,0,0\n1,SupplierA,7\n");

    let err = run(&args).await.unwrap_err();

    assert!(format!("{err:#}").contains("logistics provider 7"), "{err:#}");
    assert!(!args.output_path.exists());
}
