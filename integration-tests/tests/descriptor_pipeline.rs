//! Descriptor read, edit and write round trips through the file system.

mod common;

use anyhow::Result;
use common::TestContext;
use ctd_sdk::params::LIST_SEPARATOR;
use ctd_sdk::{DescriptorReader, DescriptorWriter, ParameterError, ValueKind};

#[test]
fn test_read_blast_descriptor() -> Result<()> {
    let ctx = TestContext::new()?;
    let config = ctx.blast()?;

    assert_eq!(config.name, "Blast");
    assert_eq!(config.version, "2.2.26");
    assert_eq!(config.category, "Alignment");
    assert_eq!(config.executable_name, "blastall");
    assert_eq!(config.executable_path, "$ROOT/bin/blastall");
    assert_eq!(
        config.manual,
        "Aligns query sequences against a database & reports hits."
    );
    assert_eq!(config.citations.len(), 1);
    assert_eq!(config.cli.len(), 6);

    let evalue = config.parameters.parameter("blast.options.evalue")?;
    assert!(matches!(evalue.kind(), ValueKind::Double { .. }));
    assert_eq!(evalue.string_representation(), "10.0");
    assert!(config.parameters.is_advanced("blast.options.hits")?);
    assert!(!config.parameters.is_optional("blast.i")?);
    assert!(config.parameters.is_optional("blast.d")?);

    assert_eq!(config.inputs.len(), 2);
    assert_eq!(config.outputs.len(), 1);
    let query = config.port("blast.i").expect("query port");
    assert_eq!(query.formats, vec!["fasta", "fa"]);
    assert_eq!(
        config.node_descriptions.get("blast.options").map(String::as_str),
        Some("Search options")
    );
    Ok(())
}

#[test]
fn test_itemlist_padded_to_declared_size() -> Result<()> {
    let ctx = TestContext::new()?;
    let config = ctx.blast()?;

    let databases = config.parameters.parameter("blast.options.databases")?;
    assert!(databases.is_list());
    assert_eq!(databases.declared_size(), Some(3));
    assert_eq!(databases.values(), vec!["nr", "pdb", ""]);
    assert_eq!(
        databases.string_representation(),
        format!("nr{LIST_SEPARATOR}pdb{LIST_SEPARATOR}{LIST_SEPARATOR}")
    );
    Ok(())
}

#[test]
fn test_edit_save_and_reread() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut writer = DescriptorWriter::new(ctx.blast()?);

    writer.set_parameter_value("blast.i", "query.fasta")?;
    writer.set_parameter_value("blast.options.evalue", "1e-5")?;
    writer.set_parameter_value("blast.options.filter", "false")?;
    writer.set_parameter_value("blast.options.comment", "say \"hi\" <&>")?;
    writer.set_multi_parameter_value("blast.options.databases", "swissprot")?;

    let saved = ctx.path().join("out").join("blast.ctd");
    writer.write_to_path(&saved)?;
    let reread = DescriptorReader::read_file(&saved)?;

    let original = writer.config();
    assert_eq!(original.parameters.len(), reread.parameters.len());
    for parameter in &original.parameters {
        assert_eq!(
            parameter.string_representation(),
            reread.string_representation(parameter.key())?,
            "value of {} changed across the round trip",
            parameter.key()
        );
    }
    assert_eq!(reread.string_representation("blast.o")?, "");
    assert_eq!(
        reread.parameters.parameter("blast.options.databases")?.values(),
        vec!["nr", "pdb", "", "swissprot"]
    );
    assert_eq!(reread.cli, original.cli);
    assert_eq!(reread.manual, original.manual);
    Ok(())
}

#[test]
fn test_rejected_value_leaves_descriptor_untouched() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut config = ctx.blast()?;

    let err = config
        .set_value_from_string("blast.options.hits", "501")
        .unwrap_err();
    assert!(matches!(err, ParameterError::Validation { .. }));
    assert_eq!(config.string_representation("blast.options.hits")?, "50");

    let err = config
        .set_value_from_string("blast.options.program", "tblastx")
        .unwrap_err();
    assert!(matches!(err, ParameterError::Validation { .. }));
    assert_eq!(config.string_representation("blast.options.program")?, "blastp");

    assert!(matches!(
        config.set_value_from_string("blast.nope", "1"),
        Err(ParameterError::UnknownParameter { .. })
    ));
    Ok(())
}

#[test]
fn test_parameters_file_applies_to_fresh_copy() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut edited = DescriptorWriter::new(ctx.blast()?);
    edited.set_parameter_value("blast.i", "reads.fa")?;
    edited.set_parameter_value("blast.options.hits", "7")?;

    let mut params = Vec::new();
    edited.write_params(&mut params)?;

    let mut fresh = ctx.blast()?;
    DescriptorReader::new(String::from_utf8(params)?).apply_parameters(&mut fresh)?;
    assert_eq!(fresh.string_representation("blast.i")?, "reads.fa");
    assert_eq!(fresh.string_representation("blast.options.hits")?, "7");
    assert_eq!(fresh.string_representation("blast.options.evalue")?, "10.0");
    Ok(())
}

#[test]
fn test_reset_and_unset_through_tree() -> Result<()> {
    let ctx = TestContext::new()?;
    let mut config = ctx.blast()?;

    config.set_value_from_string("blast.options.hits", "3")?;
    config.parameters.reset("blast.options.hits")?;
    assert_eq!(config.string_representation("blast.options.hits")?, "50");

    config.parameters.unset("blast.options.comment")?;
    assert_eq!(config.string_representation("blast.options.comment")?, "");
    assert!(config.parameters.unset("blast.i").is_err());
    Ok(())
}
