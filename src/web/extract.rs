// src/web/extract.rs
use crate::{error::AppError, services::storage_service::UploadedImage};
use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use validator::{Validate, ValidationError, ValidationErrors};

/// Nome do campo de ficheiro da foto de perfil nos formulários multipart.
pub const PROFILE_PIC_FIELD: &str = "profilePicUrl";

/// ID do utilizador autenticado, posto nas extensões por `mw_auth::require_auth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

/// `Path` cuja rejeição passa por `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// `Query` cuja rejeição passa por `AppError`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// JSON desserializado e validado. Falha de parse -> 400, falha de regra -> 422.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedBody(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Formulário multipart já lido: campos de texto + foto opcional.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
}

impl MultipartForm {
    /// Campo de texto; vazio conta como ausente.
    pub fn text(&mut self, name: &str) -> Option<String> {
        self.fields
            .remove(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Campo numérico; texto que não é número vira erro de validação nesse campo.
    pub fn integer(&mut self, name: &'static str) -> Result<Option<i64>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw.parse::<i64>().map(Some).map_err(|_| {
                let mut errors = ValidationErrors::new();
                errors.add(
                    name,
                    ValidationError::new("integer").with_message("Must be a whole number".into()),
                );
                AppError::Validation(errors)
            }),
        }
    }
}

impl<S: Send + Sync> FromRequest<S> for MultipartForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedBody(rejection.body_text()))?;

        let mut form = MultipartForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::MalformedBody(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == PROFILE_PIC_FIELD && field.file_name().is_some() {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::MalformedBody(e.body_text()))?;
                if !bytes.is_empty() {
                    form.image = Some(UploadedImage {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::MalformedBody(e.body_text()))?;
            tracing::debug!("Multipart: campo '{}' recebido", name);
            form.fields.insert(name, value);
        }

        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> MultipartForm {
        MultipartForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image: None,
        }
    }

    #[test]
    fn blank_text_fields_count_as_missing() {
        let mut form = form(&[("name", "  Maria "), ("district", "   ")]);
        assert_eq!(form.text("name").as_deref(), Some("Maria"));
        assert_eq!(form.text("district"), None);
        assert_eq!(form.text("absent"), None);
    }

    #[test]
    fn integer_fields_report_field_errors() {
        let mut form = form(&[("number", "12"), ("addressId", "abc")]);
        assert_eq!(form.integer("number").unwrap(), Some(12));
        match form.integer("addressId") {
            Err(AppError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("addressId"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
