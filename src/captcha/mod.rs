//! Captcha module
//!
//! - `CaptchaSolver`: the recognizer seam (`classify(bytes) -> text`)
//! - `CommandSolver`: recognizer backed by an external OCR program
//! - `ScratchImage` / `stage_image`: the scoped on-disk copy of the captcha image

mod scratch;
mod solver;

pub use scratch::{stage_image, ScratchImage};
pub use solver::{
    is_usable_code, CaptchaError, CaptchaResult, CaptchaSolver, CommandSolver, CAPTCHA_CODE_LEN,
};
