mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::script;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;

#[test]
fn test_cli_card_payment() -> Result<(), Box<dyn std::error::Error>> {
    let file = script(&[
        "add,Apple",
        "add,Banana",
        "add,Apple",
        "checkout,card",
        "card,4111111111111111,12/99,123,Asha Rao",
        "settle",
        "otp,111111",
    ]);

    let mut cmd = Command::new(cargo_bin!("tapcheckout"));
    cmd.arg(file.path()).arg("--fast");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "method,status,amount,duration,reason",
        ))
        .stdout(predicate::str::contains("card,success,1.30,"));

    Ok(())
}

#[test]
fn test_cli_tap_and_upi_payments() -> Result<(), Box<dyn std::error::Error>> {
    let file = script(&[
        "add,Apple",
        "checkout,tap",
        "tap,",
        "settle",
        "back",
        "checkout,tap",
        "tap,PAY",
        "settle",
        "pin,2580",
        "settle",
        "add,Orange",
        "checkout,upi",
        "upi,asha@okbank",
    ]);

    let mut cmd = Command::new(cargo_bin!("tapcheckout"));
    cmd.arg(file.path()).arg("--fast");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("tap,failure,0.50,,no_ndef_data"))
        .stdout(predicate::str::contains("tap,success,0.50,"))
        .stdout(predicate::str::contains("upi,success,0.40,"));

    Ok(())
}

#[test]
fn test_cli_reports_rejections_on_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let file = script(&[
        "checkout,card",
        "add,Mango",
        "add,Banana",
        "checkout,upi",
        "upi,not-an-address",
        "upi,asha@okbank",
    ]);

    let mut cmd = Command::new(cargo_bin!("tapcheckout"));
    cmd.arg(file.path()).arg("--fast");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "Error processing command: Cart is empty",
        ))
        .stderr(predicate::str::contains("Unknown item: Mango"))
        .stderr(predicate::str::contains("Please enter a valid UPI address"))
        .stdout(predicate::str::contains("upi,success,0.30,"));

    Ok(())
}

#[test]
fn test_cli_with_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = tempfile::NamedTempFile::new()?;
    write!(
        config,
        r#"{{"prices": {{"Apple": 75}}, "max_transaction_amount": 100}}"#
    )?;
    config.flush()?;

    let file = script(&[
        "add,Apple",
        "add,Apple",
        "checkout,tap",
        "remove,Apple",
        "checkout,tap",
        "tap,PAY",
        "settle",
        "pin,2580",
    ]);

    let mut cmd = Command::new(cargo_bin!("tapcheckout"));
    cmd.arg(file.path())
        .arg("--config")
        .arg(config.path())
        .arg("--fast");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "Amount 1.50 exceeds the transaction limit of 1.00",
        ))
        .stdout(predicate::str::contains("tap,success,0.75,"));

    Ok(())
}

#[test]
fn test_cli_missing_script_fails() {
    let mut cmd = Command::new(cargo_bin!("tapcheckout"));
    cmd.arg("does/not/exist.csv");

    cmd.assert().failure();
}
