mod base;
mod placeholders;

pub use base::join_base_url;
pub use placeholders::{
    build_url, extract_parameters, missing_parameters, unique_parameters, ParamValues,
    ParameterKind, PathParameter,
};
