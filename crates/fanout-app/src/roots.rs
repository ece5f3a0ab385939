//! The `roots` use case: show the grouping without invoking anything.

use camino::Utf8Path;
use fanout_settings::Overrides;
use fanout_types::FileGroup;

use crate::run::{Targets, load_config, select};

#[derive(Clone, Debug)]
pub struct RootsInput<'a> {
    pub base_dir: &'a Utf8Path,
    pub config_text: &'a str,
    pub overrides: Overrides,
    /// When set, the hook's file filter applies and ignored files are listed as unowned.
    pub hook: Option<&'a str>,
    pub targets: Targets,
}

pub fn run_roots(input: RootsInput<'_>) -> anyhow::Result<FileGroup> {
    let resolved = load_config(input.config_text, input.overrides)?;
    let patterns = match input.hook {
        Some(name) => resolved.hook(name)?.file_patterns,
        None => Vec::new(),
    };

    let (mut group, ignored) = select(input.base_dir, &resolved.run, &patterns, &input.targets)?;
    for file in ignored {
        group.push_unowned(file);
    }
    Ok(group)
}
