//! Translator client construction and request/response endpoints
//!
//! The [`Translator`] owns the HTTP transport and exposes the service's
//! operations as typed methods. Its configuration is immutable after
//! construction; one instance can serve any number of concurrent requests.
//! Document lifecycle operations live in [`crate::document`].

use crate::config::{server_url_for_auth_key, TranslatorOptions};
use crate::error::{check_status, Error, RequestContext, Result};
use crate::glossary::GlossaryEntries;
use crate::transport::{HttpTransport, RequestOptions};
use crate::types::{Formality, GlossaryInfo, Language, LanguagePair, TextResult, Usage};
use reqwest::Method;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Options for text translation
#[derive(Clone, Debug, Default)]
pub struct TextTranslateOptions {
    /// Sentence splitting behavior ("0", "1", or "nonewlines")
    pub split_sentences: Option<String>,

    /// Respect the original formatting even where the service would normally
    /// correct it
    pub preserve_formatting: bool,

    /// Desired formality of the translation
    pub formality: Option<Formality>,

    /// ID of a glossary to apply during translation
    pub glossary_id: Option<String>,

    /// Additional context that influences the translation without being
    /// translated itself
    pub context: Option<String>,

    /// Additional parameters passed through to the endpoint verbatim
    pub extra_params: Vec<(String, String)>,
}

/// Client for a DeepL-compatible translation API
///
/// ```no_run
/// use lingo_dl::{Translator, TranslatorOptions};
///
/// # async fn example() -> Result<(), lingo_dl::Error> {
/// let translator = Translator::new("your-auth-key", TranslatorOptions::default())?;
/// let usage = translator.get_usage().await?;
/// println!("characters used: {}", usage.character_count);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Translator {
    pub(crate) transport: HttpTransport,
    pub(crate) poll_interval: Duration,
}

impl Translator {
    /// Create a client for the given auth key.
    ///
    /// Unless overridden in `options`, the base URL is selected from the
    /// auth-key shape: free-tier keys (suffix `:fx`) route to the free-tier
    /// host.
    pub fn new(auth_key: &str, options: TranslatorOptions) -> Result<Self> {
        if auth_key.trim().is_empty() {
            return Err(Error::Config {
                message: "auth_key must not be empty".to_string(),
                key: Some("auth_key".to_string()),
            });
        }

        let server_url = options
            .server_url
            .clone()
            .unwrap_or_else(|| server_url_for_auth_key(auth_key).to_string());
        let user_agent = build_user_agent(&options);
        debug!(%server_url, %user_agent, "constructing translator");

        let transport = HttpTransport::new(
            &server_url,
            auth_key,
            &user_agent,
            options.max_retries,
            options.min_timeout,
            options.backoff.clone(),
        )?;

        Ok(Self {
            transport,
            poll_interval: options.poll_interval,
        })
    }

    // -----------------------------------------------------------------------
    // Text translation
    // -----------------------------------------------------------------------

    /// Translate one or more texts into the target language.
    ///
    /// When `source_lang` is `None`, the service detects the source language
    /// per text and reports it in each [`TextResult`].
    pub async fn translate_text(
        &self,
        texts: &[&str],
        source_lang: Option<&str>,
        target_lang: &str,
        options: &TextTranslateOptions,
    ) -> Result<Vec<TextResult>> {
        if texts.is_empty() {
            return Err(Error::Config {
                message: "texts must not be empty".to_string(),
                key: None,
            });
        }

        let mut fields: Vec<(String, String)> = texts
            .iter()
            .map(|text| ("text".to_string(), (*text).to_string()))
            .collect();
        if let Some(source) = source_lang {
            fields.push(("source_lang".to_string(), source.to_string()));
        }
        fields.push(("target_lang".to_string(), target_lang.to_string()));
        if let Some(split) = &options.split_sentences {
            fields.push(("split_sentences".to_string(), split.clone()));
        }
        if options.preserve_formatting {
            fields.push(("preserve_formatting".to_string(), "1".to_string()));
        }
        if let Some(formality) = options.formality {
            if formality != Formality::Default {
                fields.push(("formality".to_string(), formality.as_str().to_string()));
            }
        }
        if let Some(glossary_id) = &options.glossary_id {
            fields.push(("glossary_id".to_string(), glossary_id.clone()));
        }
        if let Some(context) = &options.context {
            fields.push(("context".to_string(), context.clone()));
        }
        fields.extend(options.extra_params.iter().cloned());

        let response = self
            .transport
            .send_request(Method::POST, "/v2/translate", RequestOptions::with_data(fields))
            .await?;
        check_status(response.status, &response.content, RequestContext::default())?;

        #[derive(Deserialize)]
        struct TranslationsResponse {
            translations: Vec<TextResult>,
        }
        let parsed: TranslationsResponse = response.json()?;
        Ok(parsed.translations)
    }

    // -----------------------------------------------------------------------
    // Account and language queries
    // -----------------------------------------------------------------------

    /// Retrieve usage for the current billing period.
    pub async fn get_usage(&self) -> Result<Usage> {
        let response = self
            .transport
            .send_request(Method::GET, "/v2/usage", RequestOptions::default())
            .await?;
        check_status(response.status, &response.content, RequestContext::default())?;
        response.json()
    }

    /// List the languages the service can translate from.
    pub async fn get_source_languages(&self) -> Result<Vec<Language>> {
        self.get_languages("source").await
    }

    /// List the languages the service can translate into.
    pub async fn get_target_languages(&self) -> Result<Vec<Language>> {
        self.get_languages("target").await
    }

    async fn get_languages(&self, kind: &str) -> Result<Vec<Language>> {
        let options =
            RequestOptions::with_data(vec![("type".to_string(), kind.to_string())]);
        let response = self
            .transport
            .send_request(Method::GET, "/v2/languages", options)
            .await?;
        check_status(response.status, &response.content, RequestContext::default())?;
        response.json()
    }

    // -----------------------------------------------------------------------
    // Glossary management
    // -----------------------------------------------------------------------

    /// Create a glossary for one language pair.
    pub async fn create_glossary(
        &self,
        name: &str,
        source_lang: &str,
        target_lang: &str,
        entries: &GlossaryEntries,
    ) -> Result<GlossaryInfo> {
        if entries.is_empty() {
            return Err(Error::InvalidGlossaryEntries(
                "glossary must contain at least one entry".to_string(),
            ));
        }

        let fields = vec![
            ("name".to_string(), name.to_string()),
            ("source_lang".to_string(), source_lang.to_string()),
            ("target_lang".to_string(), target_lang.to_string()),
            ("entries".to_string(), entries.to_tsv()),
            ("entries_format".to_string(), "tsv".to_string()),
        ];
        let response = self
            .transport
            .send_request(
                Method::POST,
                "/v2/glossaries",
                RequestOptions::with_data(fields),
            )
            .await?;
        check_status(response.status, &response.content, RequestContext::glossary())?;
        response.json()
    }

    /// List all glossaries on the account.
    pub async fn list_glossaries(&self) -> Result<Vec<GlossaryInfo>> {
        let response = self
            .transport
            .send_request(Method::GET, "/v2/glossaries", RequestOptions::default())
            .await?;
        check_status(response.status, &response.content, RequestContext::glossary())?;

        #[derive(Deserialize)]
        struct GlossariesResponse {
            glossaries: Vec<GlossaryInfo>,
        }
        let parsed: GlossariesResponse = response.json()?;
        Ok(parsed.glossaries)
    }

    /// Retrieve metadata for one glossary.
    pub async fn get_glossary(&self, glossary_id: &str) -> Result<GlossaryInfo> {
        let path = format!("/v2/glossaries/{glossary_id}");
        let response = self
            .transport
            .send_request(Method::GET, &path, RequestOptions::default())
            .await?;
        check_status(response.status, &response.content, RequestContext::glossary())?;
        response.json()
    }

    /// Delete a glossary.
    pub async fn delete_glossary(&self, glossary_id: &str) -> Result<()> {
        let path = format!("/v2/glossaries/{glossary_id}");
        let response = self
            .transport
            .send_request(Method::DELETE, &path, RequestOptions::default())
            .await?;
        check_status(response.status, &response.content, RequestContext::glossary())?;
        Ok(())
    }

    /// Retrieve the entries of a glossary.
    pub async fn get_glossary_entries(&self, glossary_id: &str) -> Result<GlossaryEntries> {
        let path = format!("/v2/glossaries/{glossary_id}/entries");
        let options = RequestOptions {
            headers: vec![(
                "Accept".to_string(),
                "text/tab-separated-values".to_string(),
            )],
            ..RequestOptions::default()
        };
        let response = self.transport.send_request(Method::GET, &path, options).await?;
        check_status(response.status, &response.content, RequestContext::glossary())?;
        GlossaryEntries::from_tsv(&response.content)
    }

    /// List the language pairs glossaries can be created for.
    pub async fn get_glossary_language_pairs(&self) -> Result<Vec<LanguagePair>> {
        let response = self
            .transport
            .send_request(
                Method::GET,
                "/v2/glossary-language-pairs",
                RequestOptions::default(),
            )
            .await?;
        check_status(response.status, &response.content, RequestContext::default())?;

        #[derive(Deserialize)]
        struct LanguagePairsResponse {
            supported_languages: Vec<LanguagePair>,
        }
        let parsed: LanguagePairsResponse = response.json()?;
        Ok(parsed.supported_languages)
    }
}

/// Assemble the User-Agent header from the library identity, optional
/// platform details, and optional caller app info.
fn build_user_agent(options: &TranslatorOptions) -> String {
    let mut user_agent = format!("lingo-dl/{}", env!("CARGO_PKG_VERSION"));
    if options.send_platform_info {
        user_agent.push_str(&format!(
            " ({}; {})",
            std::env::consts::OS,
            std::env::consts::ARCH
        ));
    }
    if let Some(app_info) = &options.app_info {
        user_agent.push_str(&format!(" {}/{}", app_info.name, app_info.version));
    }
    user_agent
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppInfo;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_translator(server_url: &str) -> Translator {
        Translator::new(
            "test-key",
            TranslatorOptions {
                server_url: Some(server_url.to_string()),
                max_retries: 0,
                send_platform_info: false,
                ..TranslatorOptions::default()
            },
        )
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn empty_auth_key_is_rejected() {
        let err = Translator::new("", TranslatorOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        let err = Translator::new("   ", TranslatorOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn user_agent_reflects_toggles() {
        let bare = build_user_agent(&TranslatorOptions {
            send_platform_info: false,
            ..TranslatorOptions::default()
        });
        assert_eq!(bare, format!("lingo-dl/{}", env!("CARGO_PKG_VERSION")));

        let with_platform = build_user_agent(&TranslatorOptions::default());
        assert!(with_platform.contains(std::env::consts::OS));

        let with_app = build_user_agent(&TranslatorOptions {
            send_platform_info: false,
            app_info: Some(AppInfo {
                name: "my-app".to_string(),
                version: "1.2.3".to_string(),
            }),
            ..TranslatorOptions::default()
        });
        assert!(with_app.ends_with(" my-app/1.2.3"));
    }

    // -----------------------------------------------------------------------
    // Text translation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn translate_text_sends_fields_and_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .and(header("Authorization", "DeepL-Auth-Key test-key"))
            .and(body_string_contains("text=Hello%2C+world%21"))
            .and(body_string_contains("target_lang=DE"))
            .and(body_string_contains("formality=more"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"translations":[{"detected_source_language":"EN","text":"Hallo, Welt!"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let options = TextTranslateOptions {
            formality: Some(Formality::More),
            ..TextTranslateOptions::default()
        };
        let results = translator
            .translate_text(&["Hello, world!"], None, "DE", &options)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "Hallo, Welt!");
        assert_eq!(results[0].detected_source_lang.as_deref(), Some("EN"));
    }

    #[tokio::test]
    async fn translate_text_rejects_empty_input() {
        let translator = test_translator("http://localhost:1");
        let err = translator
            .translate_text(&[], None, "DE", &TextTranslateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn translate_text_classifies_quota_exhaustion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/translate"))
            .respond_with(
                ResponseTemplate::new(456).set_body_string(r#"{"message":"Quota exceeded"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let err = translator
            .translate_text(&["Hello"], None, "DE", &TextTranslateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded(_)), "got {err:?}");
    }

    // -----------------------------------------------------------------------
    // Usage and languages
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_usage_parses_counts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/usage"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"character_count":180118,"character_limit":1250000}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let usage = translator.get_usage().await.unwrap();
        assert_eq!(usage.character_count, 180_118);
        assert_eq!(usage.character_limit, 1_250_000);
        assert!(!usage.any_limit_reached());
    }

    #[tokio::test]
    async fn language_listings_pass_the_type_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/languages"))
            .and(query_param("type", "target"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"language":"DE","name":"German","supports_formality":true}]"#,
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/languages"))
            .and(query_param("type", "source"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"language":"EN","name":"English"}]"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let targets = translator.get_target_languages().await.unwrap();
        assert_eq!(targets[0].language, "DE");
        assert_eq!(targets[0].supports_formality, Some(true));

        let sources = translator.get_source_languages().await.unwrap();
        assert_eq!(sources[0].language, "EN");
        assert!(sources[0].supports_formality.is_none());
    }

    // -----------------------------------------------------------------------
    // Glossaries
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_glossary_uploads_tsv_entries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/glossaries"))
            .and(body_string_contains("entries_format=tsv"))
            .and(body_string_contains("artist%09Maler"))
            .respond_with(ResponseTemplate::new(201).set_body_string(
                r#"{
                    "glossary_id": "def3a26b-3e84-45b3-84ae-0c0aaf3525f7",
                    "name": "My glossary",
                    "ready": true,
                    "source_lang": "EN",
                    "target_lang": "DE",
                    "creation_time": "2021-08-03T14:16:18.329Z",
                    "entry_count": 1
                }"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let entries = GlossaryEntries::from_pairs([("artist", "Maler")]).unwrap();
        let info = translator
            .create_glossary("My glossary", "EN", "DE", &entries)
            .await
            .unwrap();
        assert_eq!(info.glossary_id, "def3a26b-3e84-45b3-84ae-0c0aaf3525f7");
        assert_eq!(info.entry_count, 1);
    }

    #[tokio::test]
    async fn create_glossary_rejects_empty_entries() {
        let translator = test_translator("http://localhost:1");
        let err = translator
            .create_glossary("empty", "EN", "DE", &GlossaryEntries::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGlossaryEntries(_)));
    }

    #[tokio::test]
    async fn missing_glossary_classifies_as_glossary_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/glossaries/unknown-id"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"message":"Glossary not found"}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let err = translator.get_glossary("unknown-id").await.unwrap_err();
        assert!(matches!(err, Error::GlossaryNotFound(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn get_glossary_entries_parses_tsv_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/glossaries/g1/entries"))
            .and(header("Accept", "text/tab-separated-values"))
            .respond_with(ResponseTemplate::new(200).set_body_string("artist\tMaler\n"))
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let entries = translator.get_glossary_entries("g1").await.unwrap();
        assert_eq!(entries.get("artist"), Some("Maler"));
    }

    #[tokio::test]
    async fn delete_glossary_succeeds_on_204() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v2/glossaries/g1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        translator.delete_glossary("g1").await.unwrap();
    }

    #[tokio::test]
    async fn glossary_language_pairs_are_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/glossary-language-pairs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"supported_languages":[{"source_lang":"en","target_lang":"de"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let translator = test_translator(&server.uri());
        let pairs = translator.get_glossary_language_pairs().await.unwrap();
        assert_eq!(
            pairs,
            vec![LanguagePair {
                source_lang: "en".to_string(),
                target_lang: "de".to_string(),
            }]
        );
    }
}
