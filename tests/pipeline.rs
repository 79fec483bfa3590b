//! End-to-end rendering from Turtle through SPARQL and templates

use std::fs;
use std::path::Path;

use mkrefs::{KnowledgeGraph, MkRefsError, PipelineContext, RefKind};
use tempfile::TempDir;

const GRAPH: &str = r#"
@prefix bibo: <http://purl.org/ontology/bibo/> .
@prefix dct: <http://purl.org/dc/terms/> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .
@prefix skos: <http://www.w3.org/2004/02/skos/core#> .
@prefix cito: <http://purl.org/spar/cito/> .
@prefix derw: <https://derwen.ai/ns/v1#> .
@prefix ex: <http://example.org/> .

ex:brown2020 a bibo:Article ;
    derw:citeKey "Brown2020" ;
    dct:title "Language Models are Few-Shot Learners" ;
    dct:Date "2020" ;
    dct:creator ex:brown ;
    dct:isPartOf ex:neurips ;
    bibo:doi "10.48550/arXiv.2005.14165" ;
    bibo:volume "33" .

ex:adams2019 a bibo:Slideshow ;
    derw:citeKey "Adams2019" ;
    dct:title "Graph Talk" ;
    dct:creator ex:adams .

ex:chen2021 a bibo:Article ;
    derw:citeKey "Chen2021" ;
    dct:title "Evaluating Large Language Models Trained on Code" ;
    dct:creator ex:chen .

ex:brown a foaf:Person ; foaf:name "Tom Brown" .
ex:adams a foaf:Person ; foaf:name "Ada Adams" .
ex:chen a foaf:Person ; foaf:name "Mark Chen" .
ex:neurips a bibo:Proceedings ; dct:title "NeurIPS" .

ex:ml a skos:Concept ;
    skos:prefLabel "machine learning"@en ;
    skos:altLabel "ML"@en ;
    skos:broader ex:ai , <http://www.wikidata.org/entity/Q11660> ;
    cito:usesMethodIn ex:brown2020 ;
    dct:references ex:mlbook .

ex:ai a skos:Concept ;
    skos:prefLabel "artificial intelligence"@en .

ex:mlbook dct:title "ML Book" .
"#;

const CONFIG: &str = r#"
biblio:
  graph: kg.ttl
  template: biblio.template
  page: biblio.md
  queries:
    entry: |
      PREFIX derw: <https://derwen.ai/ns/v1#>
      PREFIX dct: <http://purl.org/dc/terms/>
      PREFIX bibo: <http://purl.org/ontology/bibo/>
      SELECT ?entry ?citekey ?type ?title ?date ?doi ?volume
      WHERE {
        ?entry derw:citeKey ?citekey ; a ?type ; dct:title ?title .
        OPTIONAL { ?entry dct:Date ?date }
        OPTIONAL { ?entry bibo:doi ?doi }
        OPTIONAL { ?entry bibo:volume ?volume }
      }
    entry_author: |
      PREFIX dct: <http://purl.org/dc/terms/>
      SELECT ?entry ?auth WHERE { ?entry dct:creator ?auth }
    entry_publisher: |
      PREFIX dct: <http://purl.org/dc/terms/>
      SELECT ?entry ?pub WHERE { ?entry dct:isPartOf ?pub }
glossary:
  graph: kg.ttl
  template: glossary.template
  page: glossary.md
  queries:
    entry: |
      PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
      SELECT ?entry ?label WHERE { ?entry a skos:Concept ; skos:prefLabel ?label }
    entry_syn: |
      PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
      SELECT ?entry ?syn WHERE { ?entry skos:altLabel ?syn }
    entry_ref: |
      PREFIX dct: <http://purl.org/dc/terms/>
      SELECT ?entry ?ref WHERE { ?entry dct:references ?ref }
    entry_hyp: |
      PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
      SELECT ?entry ?hyp WHERE { ?entry skos:broader ?hyp }
    entry_cite: |
      PREFIX cito: <http://purl.org/spar/cito/>
      PREFIX derw: <https://derwen.ai/ns/v1#>
      SELECT ?entry ?cite WHERE { ?entry cito:usesMethodIn ?c . ?c derw:citeKey ?cite }
apidocs:
  template: ref.template
  page: ref.md
  package: kglab
  git: https://github.com/DerwenAI/kglab/blob/main
  includes: KnowledgeGraph
  manifest: kglab.json
"#;

const BIBLIO_TEMPLATE: &str = "# Bibliography
{% for letter, items in groups.items() %}
## {{ letter }}
{% for item in items %}
### {{ item.citekey }}
{{ item.title }}{% if item.doi %} DOI: {{ item.doi }}{% endif %}
{% for a in item.auth %}by {{ a.name }}
{% endfor %}{% if item.pub %}in {{ item.pub.title }} vol {{ item.pub.volume }}
{% endif %}{% endfor %}{% endfor %}";

const GLOSSARY_TEMPLATE: &str = "# Glossary
{% for letter, items in groups.items() %}## {{ letter }}
{% for item in items %}{% if item.redirect %}- {{ item.label }} see {{ item.redirect }}
{% else %}### {{ item.label }}
{% for h in item.hyp %}broader: {{ h }}
{% endfor %}{% for c in item.cite %}cites: {{ c }}
{% endfor %}{% for r in item.ref %}ref: {{ r.title }}
{% endfor %}{% endif %}{% endfor %}{% endfor %}";

const REF_TEMPLATE: &str = "{% for pkg in groups.package %}# {{ pkg.package }}
{% for class_name, c in pkg.class.items() %}## {{ c.ns_path }}
{% for name, m in c.method.items() %}### {{ name }}({{ m.arg_list_str }})
[source]({{ m.src_url }})
{{ m.arg_docstring }}
{% endfor %}{% endfor %}{% endfor %}";

const MANIFEST: &str = r#"{
  "package": "kglab",
  "classes": [
    {
      "name": "KnowledgeGraph",
      "methods": [
        {
          "name": "load_rdf",
          "file": "kglab/kglab.py",
          "line": 120,
          "params": [
            {"name": "self"},
            {"name": "path", "annotation": "<class 'str'>"}
          ],
          "docstring": "Load a graph.\n\n    path:\nfile to read"
        }
      ]
    }
  ]
}"#;

fn site() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    fs::write(root.join("mkrefs.yml"), CONFIG).unwrap();
    fs::write(root.join("kg.ttl"), GRAPH).unwrap();
    fs::write(root.join("biblio.template"), BIBLIO_TEMPLATE).unwrap();
    fs::write(root.join("glossary.template"), GLOSSARY_TEMPLATE).unwrap();
    fs::write(root.join("ref.template"), REF_TEMPLATE).unwrap();
    fs::write(root.join("kglab.json"), MANIFEST).unwrap();

    dir
}

fn context(root: &Path) -> PipelineContext {
    PipelineContext::from_config_file(&root.join("mkrefs.yml"), None).unwrap()
}

#[test]
fn test_render_biblio() {
    let dir = site();
    let mut ctx = context(dir.path());

    let outcome = ctx.render(RefKind::Biblio).unwrap();
    assert_eq!(outcome.entries, 3);
    assert_eq!(outcome.groups, 3);

    let md = fs::read_to_string(dir.path().join("biblio.md")).unwrap();
    assert_eq!(md, outcome.markdown);

    let a = md.find("## A").unwrap();
    let b = md.find("## B").unwrap();
    let c = md.find("## C").unwrap();
    assert!(a < b && b < c);

    assert!(md.contains("by Tom Brown"));
    assert!(md.contains("in NeurIPS vol 33"));
    assert!(md.contains("DOI: 10.48550/arXiv.2005.14165"));
    assert!(md.contains("Graph Talk\n"));

    let adams = &outcome.collection["A"][0];
    assert_eq!(adams["citekey"], "Adams2019");
    assert_eq!(adams["type"], "Slideshow");
    assert!(adams.get("doi").is_none());
    assert!(adams.get("pub").is_none());
    assert_eq!(adams["auth"][0]["name"], "Ada Adams");
}

#[test]
fn test_render_glossary() {
    let dir = site();
    let mut ctx = context(dir.path());

    let outcome = ctx.render(RefKind::Glossary).unwrap();
    let md = fs::read_to_string(dir.path().join("glossary.md")).unwrap();

    assert_eq!(outcome.collection["m"][1], serde_json::json!({"label": "ML", "redirect": "machine learning"}));
    assert!(md.contains("- ML see machine learning"));
    assert!(md.contains("broader: [artificial intelligence](#artificial-intelligence)"));
    assert!(md.contains(
        "broader: <a href='http://www.wikidata.org/entity/Q11660' target='_blank'>http://www.wikidata.org/entity/Q11660</a>"
    ));
    assert!(md.contains("cites: [[Brown2020]](../biblio/#Brown2020)"));
    assert!(md.contains("ref: ML Book"));

    let a = md.find("## a").unwrap();
    let m = md.find("## m").unwrap();
    assert!(a < m);
}

#[test]
fn test_render_apidocs() {
    let dir = site();
    let mut ctx = context(dir.path());

    ctx.render(RefKind::Apidocs).unwrap();
    let md = fs::read_to_string(dir.path().join("ref.md")).unwrap();

    assert!(md.contains("## kglab.KnowledgeGraph"));
    assert!(md.contains("### load_rdf(path)"));
    assert!(md.contains("[source](https://github.com/DerwenAI/kglab/blob/main/kglab/kglab.py#L120)"));
    assert!(md.contains("\n  * `path` : `str`  \nfile to read"));
}

#[test]
fn test_render_all_is_idempotent_and_shares_graphs() {
    let dir = site();
    let mut ctx = context(dir.path());

    let results = ctx.render_all();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|(_, r)| r.is_ok()));
    assert_eq!(ctx.loaded_graphs(), 1);

    let pages = ["biblio.md", "glossary.md", "ref.md"];
    let first: Vec<Vec<u8>> = pages
        .iter()
        .map(|p| fs::read(dir.path().join(p)).unwrap())
        .collect();

    let mut fresh = context(dir.path());
    fresh.render_all();
    let second: Vec<Vec<u8>> = pages
        .iter()
        .map(|p| fs::read(dir.path().join(p)).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_failing_type_does_not_stop_others() {
    let dir = site();
    fs::remove_file(dir.path().join("kglab.json")).unwrap();
    let mut ctx = context(dir.path());

    let results = ctx.render_all();
    for (kind, result) in &results {
        match kind {
            RefKind::Apidocs => assert!(result.is_err()),
            _ => assert!(result.is_ok()),
        }
    }
    assert!(dir.path().join("biblio.md").exists());
    assert!(dir.path().join("glossary.md").exists());
    assert!(!dir.path().join("ref.md").exists());
}

#[test]
fn test_config_errors_come_first() {
    let dir = site();
    fs::write(
        dir.path().join("mkrefs.yml"),
        "biblio:\n  graph: kg.ttl\n  page: biblio.md\n",
    )
    .unwrap();

    let err = PipelineContext::from_config_file(&dir.path().join("mkrefs.yml"), None)
        .err()
        .unwrap();
    assert!(err.is_config());
}

#[test]
fn test_unparseable_graph() {
    let dir = site();
    let path = dir.path().join("broken.ttl");
    fs::write(&path, "this is not turtle").unwrap();

    let err = KnowledgeGraph::load(&path).err().unwrap();
    assert!(matches!(err, MkRefsError::GraphLoad { .. }));
}
