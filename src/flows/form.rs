//! Extraction of the authorization code from Okta's `form_post` page.
//!
//! With `response_mode=form_post` Okta answers the authorize call with an HTML page that
//! auto-submits a form to the redirect URI. The code lives in a hidden input of that form.
//! [`AuthorizeFormReader`] keeps this page contract in one place so a markup change only
//! needs a new reader.

// crates.io
use scraper::{ElementRef, Html, Selector};
// self
use crate::_prelude::*;

/// Default `id` of the form Okta renders on the `form_post` page.
pub const DEFAULT_FORM_ID: &str = "appForm";
/// Default name of the hidden input carrying the authorization code.
pub const DEFAULT_CODE_INPUT: &str = "code";

/// Reads the authorization code (or the OAuth error) from an authorize response body.
pub trait AuthorizeFormReader
where
	Self: Send + Sync,
{
	/// Returns the authorization code embedded in `html`.
	fn read_code(&self, html: &str) -> Result<String, FormReadError>;
}

/// Failures raised while reading the authorize page.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum FormReadError {
	/// The page does not contain the expected form.
	#[error("authorize page has no `{form}` form")]
	FormMissing {
		/// Expected form `id`.
		form: String,
	},
	/// The form exists but carries neither a code nor an error.
	#[error("form `{form}` has no `{input}` input")]
	InputMissing {
		/// Form `id`.
		form: String,
		/// Expected input name.
		input: String,
	},
	/// The form relays an OAuth error instead of a code.
	#[error("authorize page relays OAuth error `{error}`")]
	Rejected {
		/// OAuth `error` code.
		error: String,
		/// Optional `error_description`.
		description: Option<String>,
	},
	/// The configured form or input name does not produce a valid selector.
	#[error("selector `{selector}` is invalid")]
	InvalidSelector {
		/// Rejected selector source.
		selector: String,
	},
}

/// [`AuthorizeFormReader`] backed by `scraper`, looking up `#<form_id> input[name=<input>]`.
#[derive(Clone, Debug)]
pub struct AppFormReader {
	form_id: String,
	code_input: String,
}
impl AppFormReader {
	/// Creates a reader for a custom form `id` and code input name.
	pub fn new(form_id: impl Into<String>, code_input: impl Into<String>) -> Self {
		Self { form_id: form_id.into(), code_input: code_input.into() }
	}

	fn input_value(form: ElementRef<'_>, name: &str) -> Result<Option<String>, FormReadError> {
		let selector = parse_selector(&format!(r#"input[name="{name}"]"#))?;

		Ok(form
			.select(&selector)
			.filter_map(|input| input.value().attr("value"))
			.find(|value| !value.is_empty())
			.map(str::to_owned))
	}
}
impl Default for AppFormReader {
	fn default() -> Self {
		Self::new(DEFAULT_FORM_ID, DEFAULT_CODE_INPUT)
	}
}
impl AuthorizeFormReader for AppFormReader {
	fn read_code(&self, html: &str) -> Result<String, FormReadError> {
		let document = Html::parse_document(html);
		let form_selector = parse_selector(&format!("#{}", self.form_id))?;
		let form = document
			.select(&form_selector)
			.next()
			.ok_or_else(|| FormReadError::FormMissing { form: self.form_id.clone() })?;

		if let Some(code) = Self::input_value(form, &self.code_input)? {
			return Ok(code);
		}
		if let Some(error) = Self::input_value(form, "error")? {
			let description = Self::input_value(form, "error_description")?;

			return Err(FormReadError::Rejected { error, description });
		}

		Err(FormReadError::InputMissing {
			form: self.form_id.clone(),
			input: self.code_input.clone(),
		})
	}
}

fn parse_selector(source: &str) -> Result<Selector, FormReadError> {
	Selector::parse(source)
		.map_err(|_| FormReadError::InvalidSelector { selector: source.to_owned() })
}
