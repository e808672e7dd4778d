use bon::Builder;
use serde::Deserialize;

const DEFAULT_ROOT_VARIABLE: &str = "this";
const DEFAULT_RELATIONSHIP_REQUIRED_CODE: &str = "@graph/RELATIONSHIP-REQUIRED";
const DEFAULT_RESOLVED_CALLBACKS_PARAM: &str = "resolvedCallbacks";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Builder)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    /// Variable bound to the node the mutation starts from.
    #[builder(into, default = DEFAULT_ROOT_VARIABLE.to_owned())]
    pub root_variable: String,

    /// Appends required-relationship validation for every written node.
    #[builder(default = true)]
    pub validate_relationships: bool,

    #[builder(into, default = DEFAULT_RELATIONSHIP_REQUIRED_CODE.to_owned())]
    pub relationship_required_code: String,

    /// Name of the map parameter holding values produced by field callbacks.
    #[builder(into, default = DEFAULT_RESOLVED_CALLBACKS_PARAM.to_owned())]
    pub resolved_callbacks_param: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let options: CompilerOptions = serde_json::from_str(r#"{ "rootVariable": "movie" }"#).unwrap();

        assert_eq!(options.root_variable, "movie");
        assert!(options.validate_relationships);
        assert_eq!(options.relationship_required_code, "@graph/RELATIONSHIP-REQUIRED");
        assert_eq!(options, CompilerOptions::builder().root_variable("movie").build());
    }
}
