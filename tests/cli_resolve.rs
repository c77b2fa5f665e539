use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

#[test]
fn resolves_m_polyres_instance_end_to_end() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let species = temp.path().join("species.nwk");
    let gene = temp.path().join("gene.nwk");
    let cst = temp.path().join("cst.nwk");
    let output = temp.path().join("out.nwk");

    fs::write(&species, "((A,B),C);\n")?;
    fs::write(&gene, "((a_A,b_B)0.2,c_C)0.2;\n")?;
    fs::write(&cst, "a_A;\nb_B;\nc_C;\n")?;

    let mut cmd = Command::cargo_bin("labelgtc")?;
    cmd.arg("--species")
        .arg(&species)
        .arg("--gene")
        .arg(&gene)
        .arg("--cst")
        .arg(&cst)
        .arg("--threshold")
        .arg("0.7")
        .arg("--limit")
        .arg("2")
        .arg("--output")
        .arg(&output)
        .arg("--quiet");

    cmd.assert().success();

    let written = fs::read_to_string(&output)?;
    assert!(written.contains("a_A"));
    assert!(written.contains("b_B"));
    assert!(written.contains("c_C"));

    Ok(())
}

#[test]
fn resolves_to_stdout_with_dash_output() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let species = temp.path().join("species.nwk");
    let gene = temp.path().join("gene.nwk");
    let cst = temp.path().join("cst.nwk");

    fs::write(&species, "((A,B),C);\n")?;
    fs::write(&gene, "((a_A,b_B)0.2,c_C)0.2;\n")?;
    fs::write(&cst, "a_A;\nb_B;\nc_C;\n")?;

    let mut cmd = Command::cargo_bin("labelgtc")?;
    cmd.arg("--species")
        .arg(&species)
        .arg("--gene")
        .arg(&gene)
        .arg("--cst")
        .arg(&cst)
        .arg("--output")
        .arg("-")
        .arg("--quiet");

    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    assert!(stdout.trim_end().ends_with(';'));

    Ok(())
}

#[test]
fn rejects_out_of_range_threshold() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let species = temp.path().join("species.nwk");
    let gene = temp.path().join("gene.nwk");
    let cst = temp.path().join("cst.nwk");
    let output = temp.path().join("out.nwk");

    fs::write(&species, "(A,B);\n")?;
    fs::write(&gene, "(a_A,b_B);\n")?;
    fs::write(&cst, "a_A;\nb_B;\n")?;

    let mut cmd = Command::cargo_bin("labelgtc")?;
    cmd.arg("--species")
        .arg(&species)
        .arg("--gene")
        .arg(&gene)
        .arg("--cst")
        .arg(&cst)
        .arg("--threshold")
        .arg("1.5")
        .arg("--output")
        .arg(&output);

    cmd.assert().failure();

    Ok(())
}

#[test]
fn rejects_malformed_covering_set() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let species = temp.path().join("species.nwk");
    let gene = temp.path().join("gene.nwk");
    let cst = temp.path().join("cst.nwk");
    let output = temp.path().join("out.nwk");

    fs::write(&species, "((A,B),C);\n")?;
    fs::write(&gene, "((a_A,b_B),c_C);\n")?;
    // Missing c_C leaf: covering set does not tile the gene tree.
    fs::write(&cst, "a_A;\nb_B;\n")?;

    let mut cmd = Command::cargo_bin("labelgtc")?;
    cmd.arg("--species")
        .arg(&species)
        .arg("--gene")
        .arg(&gene)
        .arg("--cst")
        .arg(&cst)
        .arg("--output")
        .arg(&output);

    cmd.assert().failure();

    Ok(())
}
