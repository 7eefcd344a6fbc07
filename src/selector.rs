//! Provider selection.
//!
//! Rules are evaluated in order and the first one that applies wins; there is no backtracking.
//! Capability-exclusive features come first because routing them to the wrong provider cannot
//! work at all, while the file-type check is only a tie-break. Every rule asks the registered
//! backends what they declare, so a custom backend is judged by its own capabilities.

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::Backend;
use crate::capabilities::Feature;
use crate::location::file_type_from_name;
use crate::opts::Opts;
use crate::provider::Provider;
use crate::{Error, Result};

/// Pick a provider among the registered `candidates` for transcribing `source` with `opts`.
///
/// Returns the chosen provider together with `opts`, whose `provider` field is set to the
/// choice. `default` is used when the file-type check is inconclusive.
pub fn select_provider(
    mut opts: Opts,
    source: &str,
    candidates: &[Arc<dyn Backend>],
    default: Provider,
) -> Result<(Provider, Opts)> {
    if candidates.is_empty() {
        return Err(Error::Selection("no providers are registered".into()));
    }

    let chosen = match opts.provider {
        Some(explicit) if candidates.iter().any(|b| b.provider() == explicit) => explicit,
        Some(explicit) => {
            return Err(Error::Selection(format!(
                "requested provider '{explicit}' is not registered"
            )));
        }
        None => choose(&opts, source, candidates, default)?,
    };

    opts.provider = Some(chosen);
    Ok((chosen, opts))
}

fn choose(
    opts: &Opts,
    source: &str,
    candidates: &[Arc<dyn Backend>],
    default: Provider,
) -> Result<Provider> {
    let redaction = !opts.content_redaction.is_empty();

    // 1. language identification. Multi-language identification counts too, even with a
    // language code set, since only an auto-detecting provider can honour it.
    if opts.requires_language_identification() {
        let mut required = vec![if opts.language.identify_multiple_languages {
            Feature::MultipleLanguageIdentification
        } else {
            Feature::LanguageIdentification
        }];
        if redaction {
            required.push(Feature::ContentRedaction);
        }
        return pick(candidates, &required, "language identification");
    }

    // 2. redaction
    if redaction {
        return pick(candidates, &[Feature::ContentRedaction], "content redaction");
    }

    // 3. formatting
    let formatting = formatting_features(opts);
    if !formatting.is_empty() {
        return pick(candidates, &formatting, "transcript formatting");
    }

    // 4. file type
    let file_type = file_type_from_name(source);
    let supporting: Vec<Provider> = candidates
        .iter()
        .filter(|b| b.supports_file_type(file_type))
        .map(|b| b.provider())
        .collect();

    let fallback = if candidates.iter().any(|b| b.provider() == default) {
        default
    } else {
        candidates[0].provider()
    };

    match supporting.as_slice() {
        [only] => {
            info!(provider = %only, file_type, "selected provider by file type");
            Ok(*only)
        }
        [] => {
            warn!(
                provider = %fallback,
                file_type,
                "no provider lists this file type; using default"
            );
            Ok(fallback)
        }
        _ => {
            info!(provider = %fallback, file_type, "file type supported by several providers; using default");
            Ok(fallback)
        }
    }
}

fn formatting_features(opts: &Opts) -> Vec<Feature> {
    [
        (opts.profanity_filter, Feature::ProfanityFilter),
        (
            opts.enable_automatic_punctuation,
            Feature::AutomaticPunctuation,
        ),
        (opts.enable_spoken_punctuation, Feature::SpokenPunctuation),
        (opts.enable_spoken_emojis, Feature::SpokenEmojis),
    ]
    .into_iter()
    .filter_map(|(requested, feature)| requested.then_some(feature))
    .collect()
}

fn pick(candidates: &[Arc<dyn Backend>], required: &[Feature], rule: &str) -> Result<Provider> {
    let found = candidates
        .iter()
        .find(|b| required.iter().all(|f| b.capabilities().supports(*f)))
        .map(|b| b.provider());

    match found {
        Some(provider) => {
            info!(%provider, rule, "selected provider by capability");
            Ok(provider)
        }
        None => Err(Error::Selection(format!(
            "no registered provider supports {rule} ({required:?})"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DEFAULT_PROVIDER;
    use crate::redaction::{ContentRedactionConfig, RedactionEntityType, RedactionOutput};
    use crate::testing::{AWS_WITH_PROFANITY_FILTER, Declared, GCP_WITH_M4A};

    fn backends(providers: &[Provider]) -> Vec<Arc<dyn Backend>> {
        providers
            .iter()
            .map(|p| Arc::new(Declared::of(*p)) as Arc<dyn Backend>)
            .collect()
    }

    fn both() -> Vec<Arc<dyn Backend>> {
        backends(&[Provider::Aws, Provider::Gcp])
    }

    fn english() -> Opts {
        let mut opts = Opts::default();
        opts.language.language_code = "en-US".into();
        opts
    }

    fn select(opts: Opts, source: &str) -> Provider {
        select_provider(opts, source, &both(), DEFAULT_PROVIDER)
            .expect("selection")
            .0
    }

    #[test]
    fn auto_detect_always_picks_aws() {
        let mut opts = Opts::default();
        opts.profanity_filter = true;
        opts.enable_automatic_punctuation = true;
        opts.enable_spoken_emojis = true;
        assert_eq!(select(opts.clone(), "gs://bucket/a.opus"), Provider::Aws);
        assert_eq!(select(opts, "talk.spx"), Provider::Aws);
    }

    #[test]
    fn multi_language_identification_picks_aws() {
        let mut opts = english();
        opts.language.identify_multiple_languages = true;
        opts.enable_spoken_punctuation = true;
        assert_eq!(select(opts, "a.wav"), Provider::Aws);
    }

    #[test]
    fn redaction_picks_aws_even_with_language_set() {
        let mut opts = english();
        opts.profanity_filter = true;
        opts.content_redaction.entity_types = vec![RedactionEntityType::CreditDebitNumber];
        assert_eq!(select(opts, "a.opus"), Provider::Aws);
    }

    #[test]
    fn output_only_redaction_is_still_redaction() {
        let mut opts = english();
        opts.content_redaction = ContentRedactionConfig {
            output: Some(RedactionOutput::RedactedAndUnredacted),
            ..Default::default()
        };
        assert_eq!(select(opts, "a.awb"), Provider::Aws);
    }

    #[test]
    fn formatting_picks_gcp() {
        let setters: [fn(&mut Opts); 4] = [
            |o: &mut Opts| o.profanity_filter = true,
            |o: &mut Opts| o.enable_automatic_punctuation = true,
            |o: &mut Opts| o.enable_spoken_punctuation = true,
            |o: &mut Opts| o.enable_spoken_emojis = true,
        ];
        for set in setters {
            let mut opts = english();
            set(&mut opts);
            assert_eq!(select(opts, "s3://bucket/a.m4a"), Provider::Gcp);
        }
    }

    #[test]
    fn unique_file_type_support_decides() {
        assert_eq!(select(english(), "a.m4a"), Provider::Aws);
        assert_eq!(select(english(), "a.opus"), Provider::Gcp);
        assert_eq!(select(english(), "https://example.com/a.SPX?x=1"), Provider::Gcp);
    }

    #[test]
    fn ambiguous_or_unknown_file_type_uses_default() -> anyhow::Result<()> {
        assert_eq!(select(english(), "a.mp3"), Provider::Aws);
        assert_eq!(select(english(), "a.xyz"), Provider::Aws);
        assert_eq!(select(english(), "no-extension"), Provider::Aws);

        let (chosen, _) = select_provider(english(), "a.flac", &both(), Provider::Gcp)?;
        assert_eq!(chosen, Provider::Gcp);

        let (chosen, _) = select_provider(english(), "a.flac", &backends(&[Provider::Gcp]), Provider::Aws)?;
        assert_eq!(chosen, Provider::Gcp);
        Ok(())
    }

    #[test]
    fn explicit_provider_is_honoured() -> anyhow::Result<()> {
        let mut opts = Opts::default();
        opts.provider = Some(Provider::Gcp);
        let (chosen, opts) = select_provider(opts, "a.m4a", &both(), DEFAULT_PROVIDER)?;
        assert_eq!(chosen, Provider::Gcp);
        assert_eq!(opts.provider, Some(Provider::Gcp));
        Ok(())
    }

    #[test]
    fn selected_provider_is_recorded_in_opts() -> anyhow::Result<()> {
        let (chosen, opts) = select_provider(english(), "a.opus", &both(), DEFAULT_PROVIDER)?;
        assert_eq!(opts.provider, Some(chosen));
        Ok(())
    }

    #[test]
    fn explicit_unregistered_provider_is_an_error() {
        let mut opts = english();
        opts.provider = Some(Provider::Aws);
        let err = select_provider(opts, "a.wav", &backends(&[Provider::Gcp]), Provider::Gcp).unwrap_err();
        assert!(matches!(err, Error::Selection(_)));
    }

    #[test]
    fn missing_capability_is_a_selection_error() {
        let gcp_only = backends(&[Provider::Gcp]);
        let err = select_provider(Opts::default(), "a.wav", &gcp_only, Provider::Gcp).unwrap_err();
        assert!(matches!(err, Error::Selection(ref m) if m.contains("language identification")));

        let mut opts = english();
        opts.enable_spoken_emojis = true;
        let err = select_provider(opts, "a.wav", &backends(&[Provider::Aws]), Provider::Aws).unwrap_err();
        assert!(matches!(err, Error::Selection(_)));
    }

    #[test]
    fn no_candidates_is_a_selection_error() {
        let err = select_provider(english(), "a.wav", &[], DEFAULT_PROVIDER).unwrap_err();
        assert!(matches!(err, Error::Selection(_)));
    }

    #[test]
    fn file_type_check_uses_declared_codecs() -> anyhow::Result<()> {
        let candidates: Vec<Arc<dyn Backend>> = vec![
            Arc::new(Declared::of(Provider::Aws)),
            Arc::new(Declared::with(Provider::Gcp, &GCP_WITH_M4A)),
        ];

        // Both declare m4a now, so the tie goes to the default.
        let (chosen, _) = select_provider(english(), "s3://b/a.m4a", &candidates, Provider::Gcp)?;
        assert_eq!(chosen, Provider::Gcp);
        Ok(())
    }

    #[test]
    fn feature_rules_use_declared_capabilities() -> anyhow::Result<()> {
        let candidates: Vec<Arc<dyn Backend>> = vec![
            Arc::new(Declared::with(Provider::Aws, &AWS_WITH_PROFANITY_FILTER)),
            Arc::new(Declared::of(Provider::Gcp)),
        ];
        let mut opts = english();
        opts.profanity_filter = true;
        let (chosen, _) = select_provider(opts, "a.wav", &candidates, Provider::Gcp)?;
        assert_eq!(chosen, Provider::Aws);
        Ok(())
    }
}
