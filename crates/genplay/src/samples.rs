//! Sample program/generator pairs.

/// Source of named sample pairs.
pub trait SampleCatalog {
    /// Names of every sample, in display order.
    fn list_sample_names(&self) -> Vec<String>;

    /// The `(program, plugin)` sources of a sample.
    fn load_sample(&self, name: &str) -> Option<(String, String)>;
}

struct Sample {
    name: &'static str,
    program: &'static str,
    plugin: &'static str,
}

const SAMPLES: &[Sample] = &[
    Sample {
        name: "hello",
        program: include_str!("../demos/hello.program.gen"),
        plugin: include_str!("../demos/hello.generator.gen"),
    },
    Sample {
        name: "dependency-injection",
        program: include_str!("../demos/dependency-injection.program.gen"),
        plugin: include_str!("../demos/dependency-injection.generator.gen"),
    },
    Sample {
        name: "describe",
        program: include_str!("../demos/describe.program.gen"),
        plugin: include_str!("../demos/describe.generator.gen"),
    },
];

/// The samples compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSamples;

impl SampleCatalog for BundledSamples {
    fn list_sample_names(&self) -> Vec<String> {
        SAMPLES.iter().map(|s| s.name.to_string()).collect()
    }

    fn load_sample(&self, name: &str) -> Option<(String, String)> {
        SAMPLES
            .iter()
            .find(|s| s.name == name)
            .map(|s| (s.program.to_string(), s.plugin.to_string()))
    }
}
