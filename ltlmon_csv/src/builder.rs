use crate::parser::{Formula, Properties};
use anyhow::{anyhow, bail};
use log::{debug, warn};
use ltlmon_core::{Ltl, LtlOracle};
use std::collections::HashMap;

/// Information about the loaded properties that is needed to read and print traces.
#[derive(Debug, Clone, Default)]
pub struct PropertiesData {
    /// Names of the variables used by the properties,
    /// in the order of their index in the state of a trace.
    pub signature: Vec<String>,
    /// Names of all the guarantees in the properties file.
    pub guarantees: Vec<String>,
    /// Names of the guarantees loaded into the monitor, in the order they are checked.
    pub monitored: Vec<String>,
}

pub(crate) fn build(
    properties_file: Properties,
    properties: &[String],
    all_properties: bool,
) -> anyhow::Result<(LtlOracle, PropertiesData)> {
    let builder = PropertiesBuilder::default();
    builder.build(properties_file, properties, all_properties)
}

#[derive(Default)]
struct PropertiesBuilder {
    vars: HashMap<String, usize>,
    signature: Vec<String>,
}

impl PropertiesBuilder {
    fn build(
        mut self,
        properties_file: Properties,
        properties: &[String],
        all_properties: bool,
    ) -> anyhow::Result<(LtlOracle, PropertiesData)> {
        let mut guarantees = HashMap::new();
        let mut names = Vec::new();
        for property in properties_file.guarantees {
            if guarantees.contains_key(&property.name) {
                bail!("guarantee '{}' is defined more than once", property.name);
            }
            // Every guarantee contributes to the signature, even if it is not monitored,
            // so that traces always share the same layout.
            let ltl = self.formula(property.formula);
            names.push(property.name.clone());
            guarantees.insert(property.name, ltl);
        }

        let mut oracle = LtlOracle::default();
        for formula in properties_file.assumes {
            let ltl = self.formula(formula);
            debug!("assume {ltl}");
            oracle.add_assume(ltl);
        }

        let monitored = if all_properties {
            names.clone()
        } else {
            properties.to_vec()
        };
        for name in &monitored {
            let ltl = guarantees.get(name).ok_or_else(|| {
                anyhow!("no property named '{name}' found in properties file.\n\nHint: maybe it is mispelled?")
            })?;
            debug!("guarantee '{name}': {ltl}");
            oracle.add_guarantee(ltl.clone());
        }
        if monitored.is_empty() {
            warn!("no guarantee is monitored");
        }

        let data = PropertiesData {
            signature: self.signature,
            guarantees: names,
            monitored,
        };
        Ok((oracle, data))
    }

    fn formula(&mut self, formula: Formula) -> Ltl<usize> {
        let ltl = Ltl::<String>::from(formula);
        ltl.map_vars(&mut |name: &String| self.var(name))
    }

    fn var(&mut self, name: &str) -> usize {
        if let Some(&index) = self.vars.get(name) {
            index
        } else {
            let index = self.signature.len();
            self.signature.push(name.to_owned());
            self.vars.insert(name.to_owned(), index);
            index
        }
    }
}
