mod common;

use common::{OwnerAfterAuthorizer, create, param_names, schema};
use expect_test::expect;
use graph_schema::WriteOperator;
use mutation_compiler::{CallbackRegistration, MutationCompiler, MutationError};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn creates_related_nodes_with_edge_properties() {
    let compiled = create(
        "Movie",
        json!({
            "title": "The Matrix",
            "actors": {
                "create": [{ "node": { "name": "Keanu" }, "edge": { "screenTime": 120 } }]
            }
        }),
    )
    .unwrap();

    expect![[r#"
        CREATE (this:Movie)
        SET this.id = randomUUID()
        SET this.title = $`this.create.title`
        WITH *
        CREATE (this_actors0_node:Actor)
        SET this_actors0_node.name = $`this.create.actors.create[0].node.name`
        MERGE (this)<-[this_actors0_relationship:ACTED_IN]-(this_actors0_node)
        SET this_actors0_relationship.createdAt = datetime()
        SET this_actors0_relationship.screenTime = $`this.create.actors.create[0].edge.screenTime`"#]]
    .assert_eq(&compiled.cypher());

    assert_eq!(
        param_names(&compiled),
        vec![
            "this.create.title",
            "this.create.actors.create[0].node.name",
            "this.create.actors.create[0].edge.screenTime",
        ]
    );
}

#[test]
fn connects_existing_nodes() {
    let compiled = create(
        "Movie",
        json!({
            "title": "John Wick",
            "actors": { "connect": [{ "where": { "node": { "name": "Keanu" } }, "edge": { "screenTime": 5 } }] }
        }),
    )
    .unwrap();

    expect![[r#"
        CREATE (this:Movie)
        SET this.id = randomUUID()
        SET this.title = $`this.create.title`
        WITH *
        CALL {
            WITH this
            OPTIONAL MATCH (this_actors_connect0:Actor)
            WHERE this_actors_connect0.name = $`this.create.actors.connect[0].where.node.name`
            FOREACH (_ IN CASE WHEN this_actors_connect0 IS NULL THEN [] ELSE [1] END |
                MERGE (this)<-[this_actors_connect0_relationship:ACTED_IN]-(this_actors_connect0)
                SET this_actors_connect0_relationship.createdAt = datetime()
                SET this_actors_connect0_relationship.screenTime = $`this.create.actors.connect[0].edge.screenTime`
            )
            RETURN count(*) AS connect_this_actors_connect0
        }"#]]
    .assert_eq(&compiled.cypher());
}

#[test]
fn appends_relationship_validation() {
    let schema = schema();
    let compiled = MutationCompiler::new(&schema)
        .create("Movie", &json!({ "title": "Heat" }))
        .unwrap();

    expect![[r#"
        CREATE (this:Movie)
        SET this.id = randomUUID()
        SET this.title = $`this.create.title`
        WITH *
        CALL {
            WITH this
            MATCH (this)-[this_actor_unique:ACTED_IN]->(:Actor)
            WITH count(this_actor_unique) AS c
            CALL apoc.util.validate(NOT (c <= 1), '@graph/RELATIONSHIP-REQUIRED Movie.actor must be less than or equal to one', [0])
            RETURN c AS this_actor_unique_ignored
        }
        CALL {
            WITH this
            MATCH (this)<-[this_director_unique:DIRECTED]-(:Person&Human|Studio)
            WITH count(this_director_unique) AS c
            CALL apoc.util.validate(NOT (c <= 1), '@graph/RELATIONSHIP-REQUIRED Movie.director must be less than or equal to one', [0])
            RETURN c AS this_director_unique_ignored
        }"#]]
    .assert_eq(&compiled.cypher());
}

#[test]
fn union_members_are_qualified() {
    let compiled = create(
        "Movie",
        json!({
            "title": "Speed",
            "director": { "Person": { "create": { "node": { "name": "Jan" } } } }
        }),
    )
    .unwrap();
    let cypher = compiled.cypher();

    assert!(cypher.contains("CREATE (this_director_Person0_node:Person:Human)"));
    assert!(cypher.contains("MERGE (this)<-[this_director_Person0_relationship:DIRECTED]-(this_director_Person0_node)"));
    assert_eq!(
        param_names(&compiled),
        vec!["this.create.title", "this.create.director.Person.create.node.name"]
    );
}

#[test]
fn unknown_union_members_are_rejected() {
    let err = create("Movie", json!({ "title": "Speed", "director": { "Robot": {} } })).unwrap_err();

    assert!(matches!(err, MutationError::UnknownUnionMember { ref member, .. } if member == "Robot"));
}

#[test]
fn interface_creates_are_namespaced_by_implementation() {
    let compiled = create(
        "Reviewer",
        json!({
            "name": "Roger",
            "reviewed": { "create": [{ "node": { "Movie": { "title": "Jaws" }, "Series": { "title": "Lost" } } }] }
        }),
    )
    .unwrap();
    let cypher = compiled.cypher();

    assert!(cypher.contains("CREATE (this_reviewed_Movie0_node:Movie)"));
    assert!(cypher.contains("CREATE (this_reviewed_Series0_node:Series)"));
    assert!(cypher.contains("MERGE (this)-[this_reviewed_Series0_relationship:REVIEWED]->(this_reviewed_Series0_node)"));
    assert_eq!(
        param_names(&compiled),
        vec![
            "this.create.name",
            "this.create.reviewed.Movie.create[0].node.title",
            "this.create.reviewed.Series.create[0].node.title",
        ]
    );
}

#[test]
fn one_to_one_interface_creates_one_implementation() {
    let err = create(
        "Reviewer",
        json!({ "favorite": { "create": { "node": { "Movie": { "title": "Jaws" }, "Series": { "title": "Lost" } } } } }),
    )
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Relationship field \"Reviewer.favorite\" cannot have more than one node linked"
    );
}

#[test]
fn only_set_is_allowed_on_create() {
    let err = create("Movie", json!({ "title": "Heat", "runtime_INCREMENT": 1 })).unwrap_err();

    assert!(matches!(
        err,
        MutationError::InvalidOperator { ref field, operator: WriteOperator::Increment, .. } if field == "runtime"
    ));
}

#[test]
fn create_many_binds_one_variable_per_input() {
    let schema = schema();
    let compiled = MutationCompiler::new(&schema)
        .with_options(common::unvalidated())
        .create_many("Actor", &[json!({ "name": "A" }), json!({ "name": "B" })])
        .unwrap();

    expect![[r#"
        CREATE (this0:Actor)
        SET this0.name = $`this0.create.name`
        CREATE (this1:Actor)
        SET this1.name = $`this1.create.name`"#]]
    .assert_eq(&compiled.cypher());
}

#[test]
fn nested_creates_validate_the_created_node() {
    let schema = schema();
    let compiled = MutationCompiler::new(&schema)
        .create(
            "Actor",
            &json!({ "name": "Keanu", "movies": { "create": { "node": { "title": "Speed" } } } }),
        )
        .unwrap();

    expect![[r#"
        CREATE (this:Actor)
        SET this.name = $`this.create.name`
        WITH *
        CREATE (this_movies0_node:Movie)
        SET this_movies0_node.id = randomUUID()
        SET this_movies0_node.title = $`this.create.movies.create.node.title`
        MERGE (this)-[this_movies0_relationship:ACTED_IN]->(this_movies0_node)
        WITH *
        CALL {
            WITH this_movies0_node
            MATCH (this_movies0_node)-[this_movies0_node_actor_unique:ACTED_IN]->(:Actor)
            WITH count(this_movies0_node_actor_unique) AS c
            CALL apoc.util.validate(NOT (c <= 1), '@graph/RELATIONSHIP-REQUIRED Movie.actor must be less than or equal to one', [0])
            RETURN c AS this_movies0_node_actor_unique_ignored
        }
        CALL {
            WITH this_movies0_node
            MATCH (this_movies0_node)<-[this_movies0_node_director_unique:DIRECTED]-(:Person&Human|Studio)
            WITH count(this_movies0_node_director_unique) AS c
            CALL apoc.util.validate(NOT (c <= 1), '@graph/RELATIONSHIP-REQUIRED Movie.director must be less than or equal to one', [0])
            RETURN c AS this_movies0_node_director_unique_ignored
        }"#]]
    .assert_eq(&compiled.cypher());
}

#[test]
fn after_rules_of_nested_creates_keep_the_created_node_in_scope() {
    let schema = schema();
    let authorizer = OwnerAfterAuthorizer;
    let compiled = MutationCompiler::new(&schema)
        .with_authorizer(&authorizer)
        .with_options(common::unvalidated())
        .create(
            "Actor",
            &json!({ "name": "Keanu", "movies": { "create": { "node": { "title": "Speed" } } } }),
        )
        .unwrap();

    expect![[r#"
        CREATE (this:Actor)
        SET this.name = $`this.create.name`
        WITH *
        CREATE (this_movies0_node:Movie)
        SET this_movies0_node.id = randomUUID()
        SET this_movies0_node.title = $`this.create.movies.create.node.title`
        MERGE (this)-[this_movies0_relationship:ACTED_IN]->(this_movies0_node)
        WITH this, this_movies0_node
        WHERE this_movies0_node.owner = $jwt.sub"#]]
    .assert_eq(&compiled.cypher());

    assert_eq!(compiled.params.get("jwt"), Some(&json!({ "sub": "user-1" })));
}

#[test]
fn sibling_edge_input_is_unwrapped_for_the_field_relationship() {
    let compiled = create(
        "Critic",
        json!({
            "name": "Pauline",
            "rated": {
                "create": [
                    {
                        "node": { "Movie": { "title": "Jaws" } },
                        "edge": { "Rating": { "score": 5 }, "Review": { "text": "tense" } }
                    },
                    {
                        "node": { "Series": { "title": "Lost" } },
                        "edge": { "Review": { "text": "slow" } }
                    }
                ]
            }
        }),
    )
    .unwrap();

    expect![[r#"
        CREATE (this:Critic)
        SET this.name = $`this.create.name`
        WITH *
        CREATE (this_rated_Movie0_node:Movie)
        SET this_rated_Movie0_node.id = randomUUID()
        SET this_rated_Movie0_node.title = $`this.create.rated.Movie.create[0].node.title`
        MERGE (this)-[this_rated_Movie0_relationship:RATED]->(this_rated_Movie0_node)
        SET this_rated_Movie0_relationship.score = $`this.create.rated.Movie.create[0].edge.Rating.score`
        WITH *
        CREATE (this_rated_Series1_node:Series)
        SET this_rated_Series1_node.title = $`this.create.rated.Series.create[1].node.title`
        MERGE (this)-[this_rated_Series1_relationship:RATED]->(this_rated_Series1_node)"#]]
    .assert_eq(&compiled.cypher());

    assert_eq!(
        param_names(&compiled),
        vec![
            "this.create.name",
            "this.create.rated.Movie.create[0].node.title",
            "this.create.rated.Movie.create[0].edge.Rating.score",
            "this.create.rated.Series.create[1].node.title",
        ]
    );
}

#[test]
fn callbacks_are_registered_and_read_from_resolved_values() {
    let compiled = create("Article", json!({ "title": "Hello" })).unwrap();

    expect![[r#"
        CREATE (this:Article)
        SET this.slug = $resolvedCallbacks.this_slug_slugify
        SET this.title = $`this.create.title`"#]]
    .assert_eq(&compiled.cypher());

    assert_eq!(
        compiled.callbacks,
        vec![CallbackRegistration {
            param_name: "this_slug_slugify".into(),
            callback_name: "slugify".into(),
            type_name: "Article".into(),
            field_name: "slug".into(),
        }]
    );
    assert_eq!(param_names(&compiled), vec!["this.create.title"]);
}
