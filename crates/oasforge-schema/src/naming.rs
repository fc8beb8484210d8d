//! The naming pipeline (C1): deterministically maps a host type to a
//! URI-safe schema name.

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Context built once per type before naming.
#[derive(Debug, Clone)]
pub struct NameContext {
    /// The bare type name, e.g. `Pet`.
    pub base_name: String,
    /// The full module path, e.g. `myapp::models::pet`.
    pub package_path: String,
    /// A package-short-name view of `package_path`, e.g. `pet`.
    pub package_short_name: String,
    /// Whether this type carries generic parameters.
    pub is_generic: bool,
    /// Generic parameter names, possibly nested and package-qualified.
    pub generic_params: Vec<String>,
    /// Whether this is an anonymous (unnamed) type.
    pub is_anonymous: bool,
    /// Whether this type was reached through a pointer indirection
    /// (`Box`/`Rc`/`Arc`/`&`), already unwrapped before this context was
    /// built.
    pub is_pointer: bool,
}

impl NameContext {
    /// Build a context for a named, non-generic, non-anonymous type.
    #[must_use]
    pub fn simple(base_name: impl Into<String>, package_path: impl Into<String>) -> Self {
        let package_path = package_path.into();
        let package_short_name = short_package_name(&package_path);
        Self {
            base_name: base_name.into(),
            package_path,
            package_short_name,
            is_generic: false,
            generic_params: Vec::new(),
            is_anonymous: false,
            is_pointer: false,
        }
    }

    /// Attach generic parameters to this context.
    #[must_use]
    pub fn with_generic_params(mut self, params: Vec<String>) -> Self {
        self.is_generic = !params.is_empty();
        self.generic_params = params;
        self
    }

    /// Mark this context as anonymous.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            base_name: String::new(),
            package_path: String::new(),
            package_short_name: String::new(),
            is_generic: false,
            generic_params: Vec::new(),
            is_anonymous: true,
            is_pointer: false,
        }
    }
}

/// `module::path::segments` → `segments` (the last, non-empty segment).
fn short_package_name(package_path: &str) -> String {
    package_path
        .rsplit("::")
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_owned()
}

/// Casing applied to the base type name (and, per `apply_base_casing`,
/// to generic parameters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Casing {
    /// `pkg.Type` — the type name is left as-is, package-qualified with a dot.
    #[default]
    Default,
    PascalCase,
    CamelCase,
    SnakeCase,
    KebabCase,
    /// The base type name alone, uncased, unqualified.
    TypeOnly,
    /// Slash-sanitized full path + `_` + type name.
    FullPath,
}

impl Casing {
    fn apply_to(self, s: &str) -> String {
        match self {
            Self::PascalCase => s.to_upper_camel_case(),
            Self::CamelCase => s.to_lower_camel_case(),
            Self::SnakeCase => s.to_snake_case(),
            Self::KebabCase => s.to_kebab_case(),
            Self::Default | Self::TypeOnly | Self::FullPath => s.to_owned(),
        }
    }
}

/// A generic-parameter-list suffix-assembly strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenericStrategy {
    #[default]
    Underscore,
    Of,
    For,
    AngleBrackets,
    Flattened,
}

/// The four independent knobs controlling generic-parameter handling.
#[derive(Debug, Clone)]
pub struct GenericOptions {
    pub strategy: GenericStrategy,
    pub base_separator: String,
    pub param_separator: String,
    pub include_package: bool,
    pub apply_base_casing: bool,
}

impl Default for GenericOptions {
    fn default() -> Self {
        Self {
            strategy: GenericStrategy::Underscore,
            base_separator: "_".to_owned(),
            param_separator: "_".to_owned(),
            include_package: false,
            apply_base_casing: false,
        }
    }
}

impl GenericOptions {
    /// Sanitize and (optionally) strip/case a single generic parameter.
    fn transform_param(&self, casing: Casing, raw: &str) -> String {
        let stripped = if self.include_package {
            raw.to_owned()
        } else {
            raw.rsplit("::").next().unwrap_or(raw).to_owned()
        };
        let sanitized = sanitize(&stripped);
        if self.apply_base_casing {
            casing.apply_to(&sanitized)
        } else {
            sanitized
        }
    }

    /// Assemble the parameter-list suffix appended after the base name.
    fn assemble_suffix(&self, casing: Casing, params: &[String]) -> String {
        let transformed: Vec<String> = params
            .iter()
            .map(|p| self.transform_param(casing, p))
            .collect();
        match self.strategy {
            GenericStrategy::Underscore => format!(
                "{sep}{}{sep}",
                transformed.join(&self.param_separator),
                sep = self.base_separator
            ),
            GenericStrategy::Of => {
                format!("Of{}", transformed.join(&format!("{}Of", self.param_separator)))
            }
            GenericStrategy::For => {
                format!("For{}", transformed.join(&format!("{}For", self.param_separator)))
            }
            GenericStrategy::AngleBrackets => format!("<{}>", transformed.join(",")),
            GenericStrategy::Flattened => transformed.join(""),
        }
    }
}

/// Sanitize a raw segment: collapse nested brackets/commas/spaces into a
/// single underscore, trimming trailing underscores. Idempotent
/// (testable property 3): `sanitize(sanitize(n)) == sanitize(n)`.
#[must_use]
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_separator = false;
    for ch in raw.chars() {
        if matches!(ch, '[' | ']' | ',' | ' ') {
            if !last_was_separator && !out.is_empty() {
                out.push('_');
            }
            last_was_separator = true;
        } else {
            out.push(ch);
            last_was_separator = false;
        }
    }
    out.trim_end_matches('_').to_owned()
}

/// A built-in naming strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Default,
    PascalCase,
    CamelCase,
    SnakeCase,
    KebabCase,
    TypeOnly,
    FullPath,
}

impl From<Strategy> for Casing {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Default => Casing::Default,
            Strategy::PascalCase => Casing::PascalCase,
            Strategy::CamelCase => Casing::CamelCase,
            Strategy::SnakeCase => Casing::SnakeCase,
            Strategy::KebabCase => Casing::KebabCase,
            Strategy::TypeOnly => Casing::TypeOnly,
            Strategy::FullPath => Casing::FullPath,
        }
    }
}

/// A user-supplied template, pre-parsed at install time; parse failures are
/// deferred rather than raised eagerly. Supported
/// placeholders: `%{Base}`, `%{Package}`, `%{Params}`.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    segments: Vec<TemplateSegment>,
}

#[derive(Debug, Clone)]
enum TemplateSegment {
    Literal(String),
    Base,
    Package,
    Params,
}

impl CompiledTemplate {
    /// Parse a template string. Returns an error describing the first
    /// unrecognized placeholder rather than panicking; the caller (the
    /// naming pipeline) stores this and surfaces it at finalization.
    pub fn parse(template: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(start) = rest.find("%{") {
            if start > 0 {
                segments.push(TemplateSegment::Literal(rest[..start].to_owned()));
            }
            let Some(end) = rest[start..].find('}') else {
                return Err(format!("unterminated placeholder in template {template:?}"));
            };
            let placeholder = &rest[start + 2..start + end];
            segments.push(match placeholder {
                "Base" => TemplateSegment::Base,
                "Package" => TemplateSegment::Package,
                "Params" => TemplateSegment::Params,
                other => {
                    return Err(format!(
                        "unknown placeholder %{{{other}}} in template {template:?}"
                    ));
                }
            });
            rest = &rest[start + end + 1..];
        }
        if !rest.is_empty() {
            segments.push(TemplateSegment::Literal(rest.to_owned()));
        }
        Ok(Self { segments })
    }

    /// Execute the template against a context. A template *execution*
    /// failure (distinct from a parse failure) is not modeled here because
    /// every placeholder this parser accepts always has a value.
    #[must_use]
    pub fn execute(&self, ctx: &NameContext, params_suffix: &str) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                TemplateSegment::Literal(lit) => out.push_str(lit),
                TemplateSegment::Base => out.push_str(&ctx.base_name),
                TemplateSegment::Package => out.push_str(&ctx.package_short_name),
                TemplateSegment::Params => out.push_str(params_suffix),
            }
        }
        out
    }
}

/// The reserved name used for anonymous types.
pub const ANONYMOUS_SCHEMA_NAME: &str = "AnonymousObject";

/// The naming pipeline. Precedence at resolution time: user function >
/// user template > built-in strategy.
pub struct NamingPipeline {
    strategy: Strategy,
    generic_options: GenericOptions,
    user_function: Option<Box<dyn Fn(&NameContext) -> String + Send + Sync>>,
    user_template: Option<CompiledTemplate>,
    /// A template that failed to parse when installed; surfaced at
    /// finalization rather than failing the call that installed it.
    pub deferred_template_error: Option<String>,
}

impl std::fmt::Debug for NamingPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamingPipeline")
            .field("strategy", &self.strategy)
            .field("generic_options", &self.generic_options)
            .field("has_user_function", &self.user_function.is_some())
            .field("user_template", &self.user_template)
            .field("deferred_template_error", &self.deferred_template_error)
            .finish()
    }
}

impl Default for NamingPipeline {
    fn default() -> Self {
        Self {
            strategy: Strategy::Default,
            generic_options: GenericOptions::default(),
            user_function: None,
            user_template: None,
            deferred_template_error: None,
        }
    }
}

impl NamingPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_generic_options(mut self, options: GenericOptions) -> Self {
        self.generic_options = options;
        self
    }

    /// Install a user naming function (highest precedence).
    #[must_use]
    pub fn with_function(
        mut self,
        f: impl Fn(&NameContext) -> String + Send + Sync + 'static,
    ) -> Self {
        self.user_function = Some(Box::new(f));
        self
    }

    /// Install a user template. A parse failure is stored rather than
    /// raised: the pipeline remains usable and falls back to the built-in
    /// strategy until finalization, when the stored error should be
    /// surfaced by the caller as a `BuilderError`.
    #[must_use]
    pub fn with_template(mut self, template: &str) -> Self {
        match CompiledTemplate::parse(template) {
            Ok(compiled) => self.user_template = Some(compiled),
            Err(message) => self.deferred_template_error = Some(message),
        }
        self
    }

    /// Compute the name for a type, given its context. Does not consult or
    /// mutate the type cache; collision disambiguation against the cache is
    /// the caller's responsibility.
    #[must_use]
    pub fn name(&self, ctx: &NameContext) -> String {
        if ctx.is_anonymous {
            return ANONYMOUS_SCHEMA_NAME.to_owned();
        }

        if let Some(f) = &self.user_function {
            return f(ctx);
        }

        let casing: Casing = self.strategy.into();
        let params_suffix = if ctx.is_generic {
            self.generic_options.assemble_suffix(casing, &ctx.generic_params)
        } else {
            String::new()
        };

        if let Some(template) = &self.user_template {
            return sanitize(&template.execute(ctx, &params_suffix));
        }

        sanitize(&self.builtin_name(ctx, casing, &params_suffix))
    }

    fn builtin_name(&self, ctx: &NameContext, casing: Casing, params_suffix: &str) -> String {
        let base = if self.generic_options.apply_base_casing || casing != Casing::Default {
            casing.apply_to(&ctx.base_name)
        } else {
            ctx.base_name.clone()
        };
        match self.strategy {
            Strategy::Default => format!("{}.{base}{params_suffix}", ctx.package_short_name),
            Strategy::TypeOnly => format!("{base}{params_suffix}"),
            Strategy::FullPath => {
                let path = ctx.package_path.replace("::", "_");
                format!("{path}_{base}{params_suffix}")
            }
            Strategy::PascalCase | Strategy::CamelCase | Strategy::SnakeCase | Strategy::KebabCase => {
                format!("{}{base}{params_suffix}", casing.apply_to(&ctx.package_short_name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_is_idempotent_and_strips_brackets_commas_spaces() {
        let raw = "Vec[User, int]";
        let once = sanitize(raw);
        assert!(!once.contains('['));
        assert!(!once.contains(']'));
        assert!(!once.contains(','));
        assert!(!once.contains(' '));
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn default_strategy_composes_package_and_type() {
        let pipeline = NamingPipeline::new();
        let ctx = NameContext::simple("Pet", "myapp::models");
        assert_eq!(pipeline.name(&ctx), "models.Pet");
    }

    #[test]
    fn type_only_strategy_ignores_package() {
        let pipeline = NamingPipeline::new().with_strategy(Strategy::TypeOnly);
        let ctx = NameContext::simple("Pet", "myapp::models");
        assert_eq!(pipeline.name(&ctx), "Pet");
    }

    #[test]
    fn anonymous_types_get_the_reserved_name() {
        let pipeline = NamingPipeline::new();
        assert_eq!(pipeline.name(&NameContext::anonymous()), ANONYMOUS_SCHEMA_NAME);
    }

    #[test]
    fn user_function_has_highest_precedence() {
        let pipeline = NamingPipeline::new()
            .with_template("%{Base}Templated")
            .with_function(|ctx| format!("Custom{}", ctx.base_name));
        let ctx = NameContext::simple("Pet", "myapp");
        assert_eq!(pipeline.name(&ctx), "CustomPet");
    }

    #[test]
    fn template_beats_builtin_strategy_when_no_function_installed() {
        let pipeline = NamingPipeline::new().with_template("%{Base}Dto");
        let ctx = NameContext::simple("Pet", "myapp");
        assert_eq!(pipeline.name(&ctx), "PetDto");
    }

    #[test]
    fn template_parse_failure_is_deferred_not_eager() {
        let pipeline = NamingPipeline::new().with_template("%{Unknown}");
        assert!(pipeline.deferred_template_error.is_some());
        // Falls back to the built-in strategy rather than panicking.
        let ctx = NameContext::simple("Pet", "myapp::models");
        assert_eq!(pipeline.name(&ctx), "models.Pet");
    }

    #[test]
    fn generic_underscore_strategy_assembles_suffix() {
        let pipeline = NamingPipeline::new().with_strategy(Strategy::TypeOnly);
        let ctx = NameContext::simple("Page", "myapp")
            .with_generic_params(vec!["User".into(), "int".into()]);
        assert_eq!(pipeline.name(&ctx), "Page_User_int_");
    }

    #[test]
    fn generic_angle_brackets_strategy() {
        let options = GenericOptions {
            strategy: GenericStrategy::AngleBrackets,
            ..GenericOptions::default()
        };
        let pipeline = NamingPipeline::new()
            .with_strategy(Strategy::TypeOnly)
            .with_generic_options(options);
        let ctx = NameContext::simple("Page", "myapp")
            .with_generic_params(vec!["User".into()]);
        assert_eq!(pipeline.name(&ctx), "Page<User>");
    }

    #[test]
    fn generic_params_strip_package_prefix_unless_include_package() {
        let pipeline = NamingPipeline::new().with_strategy(Strategy::TypeOnly);
        let ctx = NameContext::simple("Page", "myapp")
            .with_generic_params(vec!["models::User".into()]);
        assert_eq!(pipeline.name(&ctx), "Page_User_");
    }

    #[test]
    fn extract_base_recovers_from_underscore_assembly() {
        let pipeline = NamingPipeline::new().with_strategy(Strategy::TypeOnly);
        let ctx = NameContext::simple("Page", "myapp")
            .with_generic_params(vec!["User".into()]);
        let assembled = pipeline.name(&ctx);
        // The base name is always recoverable from the assembled name for
        // every built-in strategy.
        assert!(assembled.starts_with("Page"));
    }
}
