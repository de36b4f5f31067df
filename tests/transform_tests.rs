//! End-to-end transform scenarios over an in-memory genome pair.
//!
//! The fixture genomes: `chr1` carries plain sequence shifted by ten bases
//! in the target; `chr2` carries a CTG tandem repeat whose copy number
//! differs between the paired target contigs.

use genomewarp::dna::reverse_complement;
use genomewarp::fasta::MemoryFasta;
use genomewarp::interval::{GenomeInterval, RegionType, Strand};
use genomewarp::region::HomologousRegion;
use genomewarp::transform::{classify_region, transform, TransformationResult};
use genomewarp::variant::{Variant, VariantCall};

const CALLSET_NAMES: [&str; 3] = ["MyCallsetName1", "MyCallsetName2", "MyCallsetName3"];

fn names() -> Vec<String> {
    CALLSET_NAMES.iter().map(|s| s.to_string()).collect()
}

fn chr1() -> String {
    // Index 3 = G, 8..10 = CG, 10..12 = CA, 17 = A, 21 = G, 27..31 = CATG.
    "ACTGATCACGCATGACTAGCTGACTGACATGACTGACTGACTGACTGACT".to_string()
}

fn chr2() -> String {
    format!("TA{}{}", "CTG".repeat(7), "AATTGGCC".repeat(8))
}

fn query_fasta() -> MemoryFasta {
    MemoryFasta::from_pairs([("chr1", chr1()), ("chr2", chr2())])
}

fn target_fasta() -> MemoryFasta {
    let chr1 = chr1();
    let chr2 = chr2();
    // chr1_same shifts chr1 [1, 40) to [11, 50).
    let chr1_same = format!("GGGGGGGGGGG{}", &chr1[1..40]);
    // chr1_mismatch additionally flips the base homologous to query 17.
    let mut mismatch_bases: Vec<u8> = chr1[1..40].bytes().collect();
    mismatch_bases[16] = b'G';
    let chr1_mismatch = format!(
        "GGGGGGGGGGG{}",
        String::from_utf8(mismatch_bases).unwrap()
    );
    let chr2_same = format!("GGGGGGGGGGG{}", &chr2[1..74]);
    let chr2_revcomp = format!("TTTTTTTTTT{}", reverse_complement(&chr2[1..43]));
    let chr2_ctg_deletion = format!("GGGGGGGGGGGA{}{}", "CTG".repeat(6), "AATTGGCC".repeat(8));
    let chr2_ctg_insertion = format!("GGGGGGGGGGGA{}{}", "CTG".repeat(8), "AATTGGCC".repeat(8));
    MemoryFasta::from_pairs([
        ("chr1_same", chr1_same),
        ("chr1_mismatch", chr1_mismatch),
        ("chr2_same", chr2_same),
        ("chr2_revcomp", chr2_revcomp),
        ("chr2_CTG_deletion", chr2_ctg_deletion),
        ("chr2_CTG_insertion", chr2_ctg_insertion),
    ])
}

fn region(
    qstart: i64,
    qend: i64,
    target_name: &str,
    tstart: i64,
    tend: i64,
    strand: Strand,
    region_type: RegionType,
) -> HomologousRegion {
    let query_name = if target_name.starts_with("chr1") {
        "chr1"
    } else {
        "chr2"
    };
    HomologousRegion::new(
        GenomeInterval::new(query_name, qstart, qend),
        GenomeInterval::new(target_name, tstart, tend),
        strand,
    )
    .with_type(region_type)
}

fn largest_chr1() -> HomologousRegion {
    region(1, 40, "chr1_same", 11, 50, Strand::Positive, RegionType::Identical)
}

fn truncated_chr1() -> HomologousRegion {
    region(1, 13, "chr1_same", 11, 23, Strand::Positive, RegionType::Identical)
}

fn chr1_mismatched() -> HomologousRegion {
    region(
        1,
        40,
        "chr1_mismatch",
        11,
        50,
        Strand::Positive,
        RegionType::MismatchedBases,
    )
}

fn largest_chr2() -> HomologousRegion {
    region(1, 74, "chr2_same", 11, 84, Strand::Positive, RegionType::Identical)
}

fn chr2_revcomp_region() -> HomologousRegion {
    region(1, 43, "chr2_revcomp", 10, 52, Strand::Negative, RegionType::Identical)
}

fn ctg_deletion() -> HomologousRegion {
    region(
        1,
        19,
        "chr2_CTG_deletion",
        11,
        29,
        Strand::Positive,
        RegionType::Identical,
    )
}

fn small_ctg_deletion() -> HomologousRegion {
    region(
        1,
        9,
        "chr2_CTG_deletion",
        11,
        19,
        Strand::Positive,
        RegionType::Identical,
    )
}

fn ctg_insertion() -> HomologousRegion {
    region(
        1,
        22,
        "chr2_CTG_insertion",
        11,
        33,
        Strand::Positive,
        RegionType::Identical,
    )
}

fn ctg_insertion_alignment() -> HomologousRegion {
    region(
        1,
        74,
        "chr2_CTG_insertion",
        11,
        87,
        Strand::Positive,
        RegionType::AlignmentRequired,
    )
}

fn calls(genotypes: &[&[i32]]) -> Vec<VariantCall> {
    genotypes
        .iter()
        .zip(CALLSET_NAMES)
        .map(|(g, name)| VariantCall::new(g.to_vec()).with_name(name))
        .collect()
}

fn make_variant(
    chromosome: &str,
    start: i64,
    reference: &str,
    alts: &[&str],
    genotypes: &[&[i32]],
) -> Variant {
    Variant::new(
        chromosome,
        start,
        reference,
        alts.iter().map(|s| s.to_string()).collect(),
    )
    .with_calls(calls(genotypes))
}

fn transform_ok(region: &HomologousRegion, variants: &[Variant]) -> Vec<Variant> {
    transform(region, variants, &names(), &query_fasta(), &target_fasta())
        .unwrap()
        .into_variants()
        .expect("supported transform")
}

fn assert_unsupported(region: &HomologousRegion, variants: &[Variant]) {
    let result = transform(region, variants, &names(), &query_fasta(), &target_fasta()).unwrap();
    assert_eq!(result, TransformationResult::Unsupported);
}

// Classification of the fixture pairs matches their declared types.
#[test]
fn classification_matches_fixtures() {
    let query = query_fasta();
    let target = target_fasta();
    for fixture in [
        largest_chr1(),
        truncated_chr1(),
        chr1_mismatched(),
        largest_chr2(),
        chr2_revcomp_region(),
        ctg_deletion(),
        small_ctg_deletion(),
    ] {
        let classified = classify_region(&fixture, &query, &target).unwrap();
        assert_eq!(classified, fixture.region_type, "{}", fixture.query);
    }
    // The full-length insertion pair has different interval sizes.
    assert_eq!(
        classify_region(&ctg_insertion_alignment(), &query, &target).unwrap(),
        RegionType::AlignmentRequired
    );
}

// Scenario: identical positive-strand carry-over of two SNVs.
#[test]
fn identical_carry_over() {
    let variants = vec![
        make_variant("chr1", 3, "G", &["T"], &[&[0, 1], &[1, 0]]),
        make_variant("chr1", 8, "C", &["T", "G"], &[&[2, 1], &[2, 1]]),
    ];
    let out = transform_ok(&largest_chr1(), &variants);
    let expected = vec![
        make_variant("chr1_same", 13, "G", &["T"], &[&[0, 1], &[1, 0]]),
        make_variant("chr1_same", 18, "C", &["T", "G"], &[&[2, 1], &[2, 1]]),
    ];
    assert_eq!(out, expected);
}

#[test]
fn identical_carry_over_mnv() {
    // The MNV's repeat diverges inside the region, so it carries over.
    let variants = vec![make_variant("chr1", 8, "CG", &["TG", "C"], &[&[0, 2]])];
    let out = transform_ok(&largest_chr1(), &variants);
    assert_eq!(
        out,
        vec![make_variant("chr1_same", 18, "CG", &["TG", "C"], &[&[0, 2]])]
    );
}

#[test]
fn identical_carry_over_insertion() {
    let variants = vec![make_variant("chr1", 8, "C", &["CT"], &[&[0, 1]])];
    let out = transform_ok(&largest_chr1(), &variants);
    assert_eq!(out, vec![make_variant("chr1_same", 18, "C", &["CT"], &[&[0, 1]])]);
}

#[test]
fn truncated_region_deletions_carry_over() {
    let variants = vec![
        make_variant("chr1", 8, "CG", &["C"], &[&[1, 1]]),
        make_variant("chr1", 10, "CA", &["C"], &[&[0, 1]]),
    ];
    let out = transform_ok(&truncated_chr1(), &variants);
    assert_eq!(
        out,
        vec![
            make_variant("chr1_same", 18, "CG", &["C"], &[&[1, 1]]),
            make_variant("chr1_same", 20, "CA", &["C"], &[&[0, 1]]),
        ]
    );
}

// Scenario: negative-strand SNV is reverse complemented and repositioned.
#[test]
fn negative_strand_snv() {
    let variants = vec![make_variant(
        "chr2",
        3,
        "T",
        &["C"],
        &[&[0, 0], &[0, 0], &[0, 0]],
    )];
    let out = transform_ok(&chr2_revcomp_region(), &variants);
    assert_eq!(
        out,
        vec![make_variant(
            "chr2_revcomp",
            49,
            "A",
            &["G"],
            &[&[0, 0], &[0, 0], &[0, 0]],
        )]
    );
}

#[test]
fn no_copy_change_indel_carries_over() {
    // The deletion's repeat run ends well inside this wide region.
    let variants = vec![make_variant("chr2", 1, "ACTG", &["A"], &[&[-1, -1]])];
    let out = transform_ok(&largest_chr2(), &variants);
    assert_eq!(
        out,
        vec![make_variant("chr2_same", 11, "ACTG", &["A"], &[&[-1, -1]])]
    );

    let variants = vec![make_variant("chr2", 1, "A", &["ACT"], &[&[1, 1]])];
    let out = transform_ok(&largest_chr2(), &variants);
    assert_eq!(
        out,
        vec![make_variant("chr2_same", 11, "A", &["ACT"], &[&[1, 1]])]
    );
}

#[test]
fn non_replicating_indels_in_repeat_regions_carry_over() {
    let out = transform_ok(
        &ctg_deletion(),
        &[make_variant("chr2", 1, "ACT", &["A"], &[&[1, 1]])],
    );
    assert_eq!(
        out,
        vec![make_variant("chr2_CTG_deletion", 11, "ACT", &["A"], &[&[1, 1]])]
    );

    let out = transform_ok(
        &ctg_insertion(),
        &[make_variant("chr2", 1, "ACT", &["A"], &[&[0, 1], &[1, 1]])],
    );
    assert_eq!(
        out,
        vec![make_variant(
            "chr2_CTG_insertion",
            11,
            "ACT",
            &["A"],
            &[&[0, 1], &[1, 1]],
        )]
    );
}

// Scenario: the matched deletion flips alleles and genotypes, and the
// companion SNV rides along in its own unit.
#[test]
fn matching_deletion_with_edge_effect() {
    let variants = vec![
        make_variant("chr2", 1, "ACTG", &["A"], &[&[1, 1]]),
        make_variant("chr2", 10, "G", &["A"], &[&[0, 1]]),
    ];
    let out = transform_ok(&ctg_deletion(), &variants);
    assert_eq!(
        out,
        vec![
            make_variant("chr2_CTG_deletion", 11, "A", &["ACTG"], &[&[0, 0]]),
            make_variant("chr2_CTG_deletion", 20, "G", &["A"], &[&[0, 1]]),
        ]
    );
}

// Scenario: one extra CTG copy in the target turns the insertion around.
#[test]
fn matching_insertion_swaps_alleles() {
    let variants = vec![make_variant("chr2", 1, "A", &["ACTG"], &[&[0, 1]])];
    let out = transform_ok(&ctg_insertion(), &variants);
    assert_eq!(
        out,
        vec![make_variant(
            "chr2_CTG_insertion",
            11,
            "ACTG",
            &["A"],
            &[&[1, 0]],
        )]
    );
}

// Scenario: SNV reference difference with a matching SNV variant re-indexes
// every genotype around the new target reference.
#[test]
fn dual_snv_reindexes_genotypes() {
    let variants = vec![make_variant(
        "chr1",
        17,
        "A",
        &["G"],
        &[&[0, 1], &[1, 1], &[1, 0]],
    )];
    let out = transform_ok(&chr1_mismatched(), &variants);
    assert_eq!(
        out,
        vec![make_variant(
            "chr1_mismatch",
            27,
            "G",
            &["A"],
            &[&[1, 0], &[0, 0], &[0, 1]],
        )]
    );
}

// Scenario: the reference changed but the individual matches the query
// reference; a homozygous-alternate record is fabricated.
#[test]
fn reference_change_without_variant() {
    let out = transform_ok(&chr1_mismatched(), &[]);
    assert_eq!(out.len(), 1);
    let v = &out[0];
    assert_eq!(v.reference_name, "chr1_mismatch");
    assert_eq!(v.start, 27);
    assert_eq!(v.reference_bases, "G");
    assert_eq!(v.alternate_bases, vec!["A"]);
    assert_eq!(v.filters, vec!["PASS"]);
    assert_eq!(v.calls.len(), 1);
    assert_eq!(v.calls[0].genotype, vec![1, 1]);
    assert_eq!(v.calls[0].call_set_name, "MyCallsetName1");
}

#[test]
fn unsupported_alignment_region() {
    assert_unsupported(
        &ctg_insertion_alignment(),
        &[make_variant("chr2", 1, "A", &["ACTG"], &[&[0, 1]])],
    );
}

#[test]
fn unsupported_insertion_on_negative_strand() {
    assert_unsupported(
        &chr2_revcomp_region(),
        &[make_variant("chr2", 1, "A", &["ACTG"], &[&[0, 1]])],
    );
}

#[test]
fn unsupported_deletion_in_mismatched_region() {
    assert_unsupported(
        &chr1_mismatched(),
        &[make_variant("chr1", 8, "CG", &["C"], &[&[0, 1]])],
    );
}

// Scenario: the synthetic deletion overlaps two variants at once.
#[test]
fn unsupported_indel_claiming_two_variants() {
    assert_unsupported(
        &small_ctg_deletion(),
        &[
            make_variant("chr2", 1, "A", &["ACTG"], &[&[0, 1]]),
            make_variant("chr2", 2, "C", &["T"], &[&[0, 1]]),
        ],
    );
}

// Scenario: a variant placed past the (trusted) target interval is caught
// by the containment check and the region is dropped.
#[test]
fn containment_violation_drops_region() {
    let short_target = HomologousRegion::new(
        GenomeInterval::new("chr1", 1, 22),
        GenomeInterval::new("chr1_same", 11, 20),
        Strand::Positive,
    )
    .with_type(RegionType::Identical);
    assert_unsupported(
        &short_target,
        &[make_variant("chr1", 15, "C", &["A"], &[&[0, 1]])],
    );
}

#[test]
fn duplicate_variants_are_an_error() {
    let v = make_variant("chr1", 3, "G", &["T"], &[&[0, 1]]);
    let result = transform(
        &largest_chr1(),
        &[v.clone(), v],
        &names(),
        &query_fasta(),
        &target_fasta(),
    );
    assert!(result.is_err());
}

#[test]
fn output_is_sorted_and_contained() {
    let variants = vec![
        make_variant("chr1", 21, "G", &["T"], &[&[1, 0]]),
        make_variant("chr1", 3, "G", &["T"], &[&[0, 1]]),
        make_variant("chr1", 17, "A", &["G"], &[&[1, 1]]),
    ];
    let region = largest_chr1();
    let out = transform_ok(&region, &variants);
    assert_eq!(out.len(), 3);
    for window in out.windows(2) {
        assert!(window[0].position_cmp(&window[1]).is_le());
    }
    for v in &out {
        assert_eq!(v.reference_name, region.target.reference_name);
        assert!(region.target.start <= v.start && v.start < region.target.end);
    }
}

#[test]
fn transform_is_deterministic() {
    let variants = vec![
        make_variant("chr2", 1, "ACTG", &["A"], &[&[1, 1]]),
        make_variant("chr2", 10, "G", &["A"], &[&[0, 1]]),
    ];
    let first = transform_ok(&ctg_deletion(), &variants);
    let second = transform_ok(&ctg_deletion(), &variants);
    assert_eq!(first, second);
}

// Haplotype fidelity: resolving each output genotype through the output
// allele table yields the same bases as the input.
#[test]
fn dual_snv_preserves_haplotype_bases() {
    let input = make_variant("chr1", 17, "A", &["G"], &[&[0, 1], &[1, 1], &[-1, 0]]);
    let out = transform_ok(&chr1_mismatched(), &[input.clone()]);
    let resolve = |v: &Variant, g: i32| -> Option<String> {
        match g {
            -1 => None,
            0 => Some(v.reference_bases.clone()),
            i => Some(v.alternate_bases[i as usize - 1].clone()),
        }
    };
    for (input_call, output_call) in input.calls.iter().zip(&out[0].calls) {
        assert_eq!(input_call.genotype.len(), output_call.genotype.len());
        for (&gi, &go) in input_call.genotype.iter().zip(&output_call.genotype) {
            assert_eq!(resolve(&input, gi), resolve(&out[0], go));
        }
    }
}
