//! The seven concrete end-to-end scenarios and the key boundary cases
//! named in spec.md §8, exercised through the public facade.

use portcullis::*;
use std::sync::Arc;
use std::time::Duration;

fn headers_with(pairs: &[(&str, &str)]) -> Headers {
    let mut h = Headers::new();
    for (k, v) in pairs {
        h.insert(*k, *v);
    }
    h
}

// Scenario 1: `/hotels/:id/cancel` POST, plus its trailing-slash redirect.
#[test]
fn scenario_1_hotel_cancellation_route_and_its_redirect() {
    let mut tree: Tree<&str> = Tree::new();
    tree.add("/hotels/:id/cancel", "cancel_hotel").unwrap();
    tree.build();

    match tree.lookup("/hotels/12345/cancel", false) {
        Matched::Route { value, params } => {
            assert_eq!(*value, "cancel_hotel");
            assert_eq!(params, vec![("id".to_string(), "12345".to_string())]);
        }
        other => panic!("{other:?}"),
    }

    match tree.lookup("/hotels/12345/cancel/", true) {
        Matched::Redirect => {}
        other => panic!("expected a redirect hint, got {other:?}"),
    }
}

// Scenario 2: `/src/*filepath` GET.
#[test]
fn scenario_2_wildcard_captures_the_remaining_path() {
    let mut tree: Tree<&str> = Tree::new();
    tree.add("/src/*filepath", "serve_source").unwrap();
    tree.build();

    match tree.lookup("/src/js/inc/framework.js", false) {
        Matched::Route { value, params } => {
            assert_eq!(*value, "serve_source");
            assert_eq!(params, vec![("filepath".to_string(), "js/inc/framework.js".to_string())]);
        }
        other => panic!("{other:?}"),
    }
}

// Scenario 3: a static route always wins over a parameterized sibling.
#[test]
fn scenario_3_static_route_beats_parameterized_sibling() {
    let mut tree: Tree<&str> = Tree::new();
    tree.add("/cmd/vet", "vet").unwrap();
    tree.add("/cmd/:tool/:sub", "tool_sub").unwrap();
    tree.build();

    match tree.lookup("/cmd/vet", false) {
        Matched::Route { value, params } => {
            assert_eq!(*value, "vet");
            assert!(params.is_empty());
        }
        other => panic!("{other:?}"),
    }

    match tree.lookup("/cmd/go/build", false) {
        Matched::Route { value, params } => {
            assert_eq!(*value, "tool_sub");
            assert_eq!(
                params,
                vec![("tool".to_string(), "go".to_string()), ("sub".to_string(), "build".to_string())]
            );
        }
        other => panic!("{other:?}"),
    }
}

// Scenario 4: the cookie codec round-trips with the fixed key pair, and
// expires once its max age has passed.
#[test]
fn scenario_4_cookie_codec_round_trip_and_expiry() {
    let sign_key = b"eFWLXEewECptbDVXExokRTLONWxrTjfV".to_vec();
    let enc_key = b"KYqklJsgeclPpZutTeQKNOTWlpksRBwA".to_vec();
    let codec = CookieCodec::new(KeyRing::new(sign_key)).with_encryption(KeyRing::new(enc_key));

    let token = codec.encode("aah", b"hello").unwrap();
    assert_eq!(codec.decode("aah", &token).unwrap(), b"hello");

    let short_lived = codec.clone().with_max_age(Duration::from_secs(0));
    let token = short_lived.encode("aah", b"hello").unwrap();
    std::thread::sleep(Duration::from_millis(1100));
    let err = short_lived.decode("aah", &token).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CookieTimestampExpired);
}

// Scenario 5: Accept-header content negotiation.
#[test]
fn scenario_5_accept_header_negotiation() {
    let audio_basic: mime::Mime = "audio/basic".parse().unwrap();
    let available = [audio_basic.clone()];
    let chosen = resolve_content_type("/clip", Some("audio/*; q=0.2, audio/basic"), &available);
    assert_eq!(chosen, Some(audio_basic));

    let text_html: mime::Mime = "text/html".parse().unwrap();
    let available = [
        "text/plain".parse().unwrap(),
        text_html.clone(),
        "text/x-dvi".parse().unwrap(),
        "text/x-c".parse().unwrap(),
    ];
    let chosen = resolve_content_type(
        "/doc",
        Some("text/plain; q=0.5, text/html, text/x-dvi; q=0.8, text/x-c"),
        &available,
    );
    assert_eq!(chosen, Some(text_html.clone()));

    // An empty Accept falls through to the caller's own default; the
    // pipeline itself never invents "text/html; charset=utf-8" -- that
    // default belongs to whatever renders the response.
    let chosen = resolve_content_type("/doc", None, &available);
    assert_eq!(chosen, None);
}

// Scenario 6: permission subset matching.
#[test]
fn scenario_6_permission_subset_matching() {
    let held = Permission::parse("printer:print,query:epsoncolor");
    assert!(held.implies(&Permission::parse("printer:print")));

    let wildcard = Permission::parse("printer:*");
    assert!(wildcard.implies(&Permission::parse("printer:print,query")));

    let narrower = Permission::parse("printer:print");
    assert!(!narrower.implies(&Permission::parse("printer:print,query")));
}

// Scenario 7: bcrypt-backed form authentication.
#[test]
fn scenario_7_bcrypt_form_authentication() {
    let stored_hash = "$2y$10$2A4GsJ6SmLAMvDe8XmTam.MSkKojdobBVJfIU7GiyoM.lWt.XV3H6";
    let encoder = BcryptEncoder::new();
    assert!(encoder.verify("welcome123", stored_hash).unwrap());
    assert!(!encoder.verify("welcome@123", stored_hash).unwrap());
}

// Boundary case: OPTIONS on a route resolves via Access-Control-Request-Method.
#[test]
fn boundary_options_preflight_resolves_via_cors_request_method_header() {
    let mut registry = DomainRegistry::new();
    registry
        .add_route("example.com", true, Route::new("update", "/widgets/:id", "widgets#update").with_methods([Method::Put]))
        .unwrap();
    registry.build();

    let headers = headers_with(&[("Access-Control-Request-Method", "PUT")]);
    match registry.resolve("example.com", "/widgets/7", Method::Options, &headers, false) {
        Resolution::Route { route, .. } => assert_eq!(route.name(), "update"),
        other => panic!("{other:?}"),
    }
}

// Boundary case: POST + X-HTTP-Method-Override dispatches to the PUT tree.
#[test]
fn boundary_method_override_header_dispatches_to_overridden_tree() {
    let mut registry = DomainRegistry::new();
    registry
        .add_route("example.com", true, Route::new("update", "/widgets/:id", "widgets#update").with_methods([Method::Put]))
        .unwrap();
    registry.build();

    let headers = headers_with(&[("X-HTTP-Method-Override", "PUT")]);
    match registry.resolve("example.com", "/widgets/7", Method::Post, &headers, false) {
        Resolution::Route { route, .. } => assert_eq!(route.name(), "update"),
        other => panic!("{other:?}"),
    }
}

// Full pipeline, end to end: a session value survives a round-trip
// through dispatch -> handler mutation -> finish -> a second dispatch
// carrying the cookie the first one issued.
#[derive(Debug)]
struct AnyonePrincipal;

impl Principal for AnyonePrincipal {
    fn roles(&self) -> &[String] {
        &[]
    }
    fn permissions(&self) -> &[Permission] {
        &[]
    }
}

#[derive(Debug)]
struct AllowAllAuthenticator;

impl Authenticator for AllowAllAuthenticator {
    fn authenticate(&self, _credentials: &Credentials) -> Result<Box<dyn Principal>, AuthError> {
        Ok(Box::new(AnyonePrincipal))
    }
}

#[test]
fn full_pipeline_carries_session_state_across_two_requests() {
    let mut registry = DomainRegistry::new();
    registry
        .add_route(
            "example.com",
            true,
            Route::new("dashboard", "/dashboard", "dashboard#index").with_auth_scheme("api"),
        )
        .unwrap();
    registry.build();

    let codec = CookieCodec::new(KeyRing::new(vec![3u8; 32]));
    let session_manager = SessionManager::cookie_store(codec);

    let pipeline = Pipeline::new(registry, session_manager).register_scheme(
        "api",
        AuthScheme::ApiBearer {
            base: SchemeBase::new("api"),
            header_name: "authorization".to_string(),
        },
        Arc::new(AllowAllAuthenticator),
    );

    let mut headers = headers_with(&[("host", "example.com"), ("authorization", "Bearer anything")]);
    let request = Request::new(Method::Get, "/dashboard", headers.clone());
    let Outcome::Dispatch(mut dispatch) = pipeline.dispatch(&request, &[]).unwrap() else {
        panic!("expected a dispatched route");
    };
    assert!(dispatch.principal.is_some());
    dispatch.session.insert("visits", 1);
    let cookie = pipeline.finish(dispatch.session).unwrap().unwrap();

    headers.insert("cookie", format!("portcullis.session={cookie}"));
    let request = Request::new(Method::Get, "/dashboard", headers);
    let Outcome::Dispatch(dispatch) = pipeline.dispatch(&request, &[]).unwrap() else {
        panic!("expected a dispatched route");
    };
    assert_eq!(dispatch.session.get("visits").unwrap(), 1);
}
