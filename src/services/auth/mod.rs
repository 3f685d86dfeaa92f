pub mod admission;
pub mod factory;
pub mod path_matcher;
pub mod token_codec;
pub mod token_extractor;

pub use admission::{AdmissionEngine, AdmissionResult, Claims, Rejection, RequestContext};
pub use factory::build_admission_engine;
pub use path_matcher::{PathPattern, PublicPaths, is_public};
pub use token_codec::{
    ClaimsError, JwtCodec, TokenVerifier, ValidationSettings, VerificationKey, VerifiedToken,
};
pub use token_extractor::{BearerToken, TokenSource};
