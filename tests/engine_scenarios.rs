use std::sync::{Arc, Mutex};

use rulegate::{
    Field, MapResolver, MetadataRegistry, NullResolver, Operand, RuleDefinition, RuleSetBuilder,
    Severity, Validatable, ValidationEngine, ValidationMessage, Value,
};

struct Account {
    is_open: bool,
    minimum_balance: f64,
}

impl Validatable for Account {
    fn type_name(&self) -> &str {
        "Account"
    }

    fn field_names(&self) -> Vec<&str> {
        vec!["IsOpen", "MinimumBalance"]
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "IsOpen" => Some(Field::Value(Value::Bool(self.is_open))),
            "MinimumBalance" => Some(Field::Value(Value::Float(self.minimum_balance))),
            _ => None,
        }
    }
}

struct User {
    email: Value,
    password: Value,
    current_balance: Value,
    account: Option<Account>,
}

impl User {
    fn new() -> Self {
        Self {
            email: Value::Text("ada@lovelace.example".into()),
            password: Value::Text("longenough".into()),
            current_balance: Value::Int(500),
            account: Some(Account {
                is_open: true,
                minimum_balance: 100.0,
            }),
        }
    }
}

impl Validatable for User {
    fn type_name(&self) -> &str {
        "User"
    }

    fn field_names(&self) -> Vec<&str> {
        vec!["Email", "Password", "CurrentBalance", "Account"]
    }

    fn field(&self, name: &str) -> Option<Field<'_>> {
        match name {
            "Email" => Some(Field::Value(self.email.clone())),
            "Password" => Some(Field::Value(self.password.clone())),
            "CurrentBalance" => Some(Field::Value(self.current_balance.clone())),
            "Account" => Some(Field::Object(
                self.account.as_ref().map(|a| a as &dyn Validatable),
            )),
            _ => None,
        }
    }

    fn configure(&self, rules: &mut RuleSetBuilder) {
        rules
            .rule(RuleDefinition::has_value("Email").fallback("cannot be blank"))
            .rule(RuleDefinition::custom("Email", "email_format").fallback("must be an address"))
            .rule(
                RuleDefinition::number_greater_than(
                    "CurrentBalance",
                    Operand::path("Account.MinimumBalance").unwrap(),
                )
                .severity(Severity::Warning)
                .gated_on("Account.IsOpen".parse().unwrap())
                .message_key("balance.minimum")
                .fallback("balance is below the account minimum"),
            )
            .rule(
                RuleDefinition::string_length_greater_than("Password", 6)
                    .gated_on("Email".parse().unwrap())
                    .fallback("password too short"),
            )
            .rule(
                RuleDefinition::string_length_less_than("Password", 20)
                    .gated_on("Email".parse().unwrap())
                    .fallback("password too long"),
            )
            .handler("email_format", |args| {
                let text = args.value.as_text().unwrap_or("");
                let has_domain = text
                    .split_once('@')
                    .is_some_and(|(_, domain)| domain.contains('.'));
                if has_domain {
                    None
                } else {
                    Some(ValidationMessage::new(
                        args.fallback.severity,
                        format!("{} must contain '@' and a domain", args.descriptor.name),
                        args.fallback.rule.clone(),
                    ))
                }
            });
    }
}

fn engine() -> ValidationEngine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    ValidationEngine::with_registry(Arc::new(MetadataRegistry::new()), NullResolver)
}

#[test]
fn blank_email_fails_presence_and_format() {
    let engine = engine();
    let mut user = User::new();
    user.email = Value::Text("".into());

    engine.validate_property(&user, "Email").unwrap();
    let msgs = engine.messages("Email");
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].text, "cannot be blank");
    assert_eq!(msgs[1].text, "Email must contain '@' and a domain");
    assert!(!engine.is_valid());
}

#[test]
fn closed_account_suppresses_balance_rule() {
    let engine = engine();
    let mut user = User::new();
    user.current_balance = Value::Int(5);
    user.account = Some(Account {
        is_open: false,
        minimum_balance: 100.0,
    });

    engine.validate_property(&user, "CurrentBalance").unwrap();
    assert!(engine.messages("CurrentBalance").is_empty());
    assert!(engine.is_valid());
}

#[test]
fn absent_account_leaves_balance_rule_unsatisfiable() {
    let engine = engine();
    let mut user = User::new();
    user.current_balance = Value::Int(5);
    user.account = None;

    engine.validate_property(&user, "CurrentBalance").unwrap();
    assert!(engine.messages("CurrentBalance").is_empty());
}

#[test]
fn low_balance_on_open_account_warns_with_fallback_text() {
    let engine = engine();
    let mut user = User::new();
    user.current_balance = Value::Int(50);

    engine.validate_object(&user).unwrap();
    let msgs = engine.messages("CurrentBalance");
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].severity, Severity::Warning);
    assert_eq!(msgs[0].text, "balance is below the account minimum");
    // A lone warning never blocks validity.
    assert!(engine.is_valid());
}

#[test]
fn localization_hit_replaces_fallback_text() {
    let resolver = MapResolver::default().with("balance.minimum", "saldo abaixo do mínimo");
    let engine = ValidationEngine::with_registry(Arc::new(MetadataRegistry::new()), resolver);
    let mut user = User::new();
    user.current_balance = Value::Int(50);

    engine.validate_property(&user, "CurrentBalance").unwrap();
    assert_eq!(engine.messages("CurrentBalance")[0].text, "saldo abaixo do mínimo");
}

#[test]
fn invalid_email_gates_out_both_length_rules() {
    let engine = engine();
    let mut user = User::new();
    user.email = Value::Text("".into());
    user.password = Value::Text("abc".into());

    engine.validate_object(&user).unwrap();
    // Password length violates the lower bound, but both rules are gated on
    // Email being currently valid.
    assert!(engine.messages("Password").is_empty());
    assert!(!engine.messages("Email").is_empty());
}

#[test]
fn valid_email_lets_length_rules_run() {
    let engine = engine();
    let mut user = User::new();
    user.password = Value::Text("abc".into());

    engine.validate_object(&user).unwrap();
    let msgs = engine.messages("Password");
    assert_eq!(msgs.len(), 1);
    assert_eq!(msgs[0].text, "password too short");
}

#[test]
fn full_object_validation_is_idempotent() {
    let engine = engine();
    let mut user = User::new();
    user.email = Value::Text("".into());
    user.password = Value::Text("abc".into());
    user.current_balance = Value::Int(50);

    let first = engine.validate_object(&user).unwrap();
    assert!(!first.changed.is_empty());
    let snapshot = engine.aggregator().all_messages();

    let second = engine.validate_object(&user).unwrap();
    assert!(second.changed.is_empty());
    assert_eq!(engine.aggregator().all_messages(), snapshot);
}

#[test]
fn fixing_email_fans_out_to_gated_password_rules() {
    let engine = engine();
    let mut user = User::new();
    user.email = Value::Text("".into());
    user.password = Value::Text("abc".into());
    engine.validate_object(&user).unwrap();
    assert!(engine.messages("Password").is_empty());

    let notified = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&notified);
    engine.subscribe(move |property, _| {
        sink.lock().unwrap().push(property.to_string());
    });

    // Host reports that Email was written; the engine re-validates it and,
    // transitively, the Password rules gated on it.
    user.email = Value::Text("ada@lovelace.example".into());
    let outcome = engine.property_changed(&user, "Email").unwrap();
    assert!(outcome.changed.contains(&"Email".to_string()));
    assert!(outcome.changed.contains(&"Password".to_string()));
    assert_eq!(engine.messages("Password").len(), 1);

    let notified = notified.lock().unwrap();
    assert!(notified.contains(&"Email".to_string()));
    assert!(notified.contains(&"Password".to_string()));
}
