//! Shared test utilities for integration tests.
//!
//! Provides scratch directories, executor configuration and the sample
//! descriptors used across the descriptor, command and execution tests.

#![allow(dead_code)]

use anyhow::Result;
use ctd_sdk::{DescriptorReader, ExecutorConfig, NodeConfiguration};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A descriptor exercising every parameter type, nesting and the cli.
pub const BLAST_DESCRIPTOR: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tool name="Blast" version="2.2.26" category="Alignment" docurl="https://example.org/blast">
  <description>Local alignment search</description>
  <manual>Aligns query sequences against a database &amp; reports hits.</manual>
  <executableName>blastall</executableName>
  <executablePath>$ROOT/bin/blastall</executablePath>
  <citations>
    <citation doi="10.1016/S0022-2836(05)80360-2" url="https://example.org/paper"/>
  </citations>
  <cli>
    <clielement optionIdentifier="-i" isList="false" isRequired="true">
      <mapping referenceName="blast.i"/>
    </clielement>
    <clielement optionIdentifier="-d" isList="false" isRequired="false">
      <mapping referenceName="blast.d"/>
    </clielement>
    <clielement optionIdentifier="-e" isList="false" isRequired="false">
      <mapping referenceName="blast.options.evalue"/>
    </clielement>
    <clielement optionIdentifier="-db" isList="true" isRequired="false">
      <mapping referenceName="blast.options.databases"/>
    </clielement>
    <clielement optionIdentifier="-p" isList="false" isRequired="false">
      <mapping referenceName="blast.options.program"/>
    </clielement>
    <clielement optionIdentifier="-F" isList="false" isRequired="false">
      <mapping referenceName="blast.options.filter"/>
    </clielement>
  </cli>
  <PARAMETERS version="1.7.0">
    <NODE name="blast" description="BLAST parameters">
      <ITEM name="i" value="" type="input-file" supported_formats="*.fasta,*.fa" required="true" description="Query"/>
      <ITEM name="d" value="" type="input-file" supported_formats="*.fasta" description="Database"/>
      <ITEM name="o" value="" type="output-file" supported_formats="*.xml"/>
      <NODE name="options" description="Search options">
        <ITEM name="evalue" value="10.0" type="double" restrictions="0:"/>
        <ITEM name="hits" value="50" type="int" restrictions="1:500" advanced="true"/>
        <ITEM name="program" value="blastp" type="string" restrictions="blastn,blastp,blastx"/>
        <ITEM name="filter" value="true" type="bool"/>
        <ITEM name="comment" value="" type="string"/>
        <ITEMLIST name="databases" type="string" size="3">
          <LISTITEM value="nr"/>
          <LISTITEM value="pdb"/>
        </ITEMLIST>
      </NODE>
    </NODE>
  </PARAMETERS>
</tool>
"#;

/// Integration test context providing a scratch directory.
pub struct TestContext {
    /// Temporary directory for test files
    pub temp_dir: TempDir,
}

impl TestContext {
    /// Creates a new test context.
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Gets the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Creates a test file with given content.
    pub fn create_test_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Executor configuration with a work directory inside the context.
    pub fn executor_config(&self) -> Result<ExecutorConfig> {
        Ok(ExecutorConfig::builder()
            .work_dir(self.path().join("work"))
            .poll_interval(Duration::from_millis(10))
            .build()?)
    }

    /// Writes [`BLAST_DESCRIPTOR`] to disk and reads it back.
    pub fn blast(&self) -> Result<NodeConfiguration> {
        let path = self.create_test_file("blast.ctd", BLAST_DESCRIPTOR)?;
        Ok(DescriptorReader::read_file(path)?)
    }
}

/// Builds a descriptor for `sh -c <script> sh ...` with the given extra
/// cli elements and parameter items.
pub fn shell_descriptor(script: &str, cli: &str, items: &str) -> String {
    format!(
        r#"<tool name="Shell">
  <executableName>sh</executableName>
  <cli>
    <clielement optionIdentifier="-c"/>
    <clielement optionIdentifier="{script}"/>
    <clielement optionIdentifier="sh"/>
    {cli}
  </cli>
  <PARAMETERS>
    <NODE name="tool">
      {items}
    </NODE>
  </PARAMETERS>
</tool>"#,
        script = escape_attribute(script),
    )
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
