//! Sign-in, registration, and session commands.

use secrecy::{ExposeSecret, SecretString};

use fastbite_client::{Runtime, Severity};
use fastbite_core::models::RegisterRequest;
use fastbite_core::{Email, Role};

use super::CommandError;

const PASSWORD_ENV: &str = "FASTBITE_PASSWORD";

/// Password from the command line, or from `FASTBITE_PASSWORD`.
///
/// # Errors
///
/// Returns [`CommandError::MissingPassword`] if neither is set.
pub fn password_or_env(password: Option<String>) -> Result<SecretString, CommandError> {
    password
        .or_else(|| std::env::var(PASSWORD_ENV).ok())
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
        .ok_or(CommandError::MissingPassword)
}

/// Sign in and report the landing view.
pub async fn login(runtime: &Runtime, email: &str, password: &SecretString) -> Result<(), CommandError> {
    let Some(route) = runtime.sign_in(email, password.expose_secret()).await? else {
        return Err(CommandError::Invalid("Invalid email or password".to_string()));
    };

    let name = runtime.session().profile().map(|p| p.name).unwrap_or_default();
    runtime
        .notifier()
        .show_alert(&format!("Welcome, {name}"), Severity::Success);
    tracing::info!(target: "fastbite::nav", "-> {route}");
    Ok(())
}

/// Create an account, sign in, and report the landing view.
pub async fn register(
    runtime: &Runtime,
    email: &str,
    password: &SecretString,
    name: &str,
    phone: Option<String>,
    role: Role,
) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::Invalid(e.to_string()))?;
    if password.expose_secret().chars().count() < RegisterRequest::MIN_PASSWORD_LENGTH {
        return Err(CommandError::Invalid(format!(
            "Password must be at least {} characters",
            RegisterRequest::MIN_PASSWORD_LENGTH
        )));
    }
    if name.trim().is_empty() {
        return Err(CommandError::Invalid("Name is required".to_string()));
    }
    if !role.is_recognized() {
        return Err(CommandError::Invalid(format!("Unknown role: {role}")));
    }

    let registration = RegisterRequest {
        email: email.into_inner(),
        password: password.expose_secret().to_owned(),
        name: name.trim().to_owned(),
        phone: phone.filter(|p| !p.trim().is_empty()),
        role,
    };

    let Some(route) = runtime.sign_up(&registration).await? else {
        return Err(CommandError::Invalid("Registration was not accepted".to_string()));
    };

    runtime
        .notifier()
        .show_alert("Account created", Severity::Success);
    tracing::info!(target: "fastbite::nav", "-> {route}");
    Ok(())
}

/// Sign out.
pub fn logout(runtime: &Runtime) -> Result<(), CommandError> {
    runtime.sign_out()?;
    runtime.notifier().show_alert("Signed out", Severity::Info);
    Ok(())
}

/// Print the signed-in user.
#[allow(clippy::print_stdout)]
pub fn whoami(runtime: &Runtime) {
    match runtime.session().profile() {
        Some(profile) => println!(
            "{} <{}> {} (id {})",
            profile.name, profile.email, profile.role, profile.id
        ),
        None => println!("Not signed in"),
    }
}
