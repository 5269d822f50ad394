mod char_to_key_name;
mod keysym_names;

pub use char_to_key_name::CharToKeyName;
pub use keysym_names::{KeysymNames, BACKSPACE, NO_SYMBOL};
