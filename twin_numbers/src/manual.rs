/*!

This is the long-form manual for `twin_numbers` and `twinaudit`.

## Input formats

Each area has two result documents named after the area code
(`100101.json`), one in the constituency directory and one in the
party-list directory. Both hold an `entries` list:

```json
{ "entries": [
    { "candidateCode": "CANDIDATE-MP-10010105", "partyCode": "PARTY-0099", "voteTotal": 30211 },
    { "candidateCode": "CANDIDATE-MP-10010101", "partyCode": "PARTY-0001", "voteTotal": 20544 }
] }
```

Party-list rows carry `partyCode`, `voteTotal` and a 1-based `rank`.
Constituency rows must be sorted by descending votes: the first row is the
winner. Missing `entries` is read as an empty list.

The ballot number of a candidate is the integer that follows
`CANDIDATE-MP-<area code>` in its code. The number of a party is the integer
after the last hyphen of its code. Any other shape is not a candidate of the
area and the area is skipped.

The optional province table looks like:

```json
{ "provinces": [ { "code": "PROVINCE-10", "name": "กรุงเทพมหานคร" } ] }
```

The first two characters of an area code are its province prefix.
Provinces missing from the table are reported as `Unknown (<prefix>)`.

## Rules

| rule | default | meaning |
|------|---------|---------|
| `excludedNumbers` | 6, 9, 11 | ballot numbers that are never flagged, and that form group B |
| `maxWinnerNumber` | 9 | winners above it are never flagged; comparison targets are 1 up to it |
| `maxTwinRank` | 7 | worst party-list rank of a flagged twin party |
| `luckyMaxNumber` | 15 | upper bound of group A |
| `areaRatioZeroPolicy` | `floorAtOne` | twin ratio when the winner has no votes |
| `nationwideRatioZeroPolicy` | `null` | party ratio when the party has no constituency votes |
| `suspiciousRatio`, `severeRatio` | 20, 100 | verdict thresholds of the nationwide party ratio |

The two zero policies are independent. The per-area ratio of a
winner with zero votes is the raw twin vote count, while a nationwide party
without constituency votes has no ratio at all.

## Outputs

* `anomaly_report.json`: the flagged areas, highest twin votes first. Each
  carries the excess over the twin party's average in non-twin areas and the
  relative increase (0 when that average is 0).
* `province_stats.json`: flagged areas grouped by province, by total twin votes.
* `mp_party_stats.json`: flagged areas grouped by the winner's own party,
  by number of areas, with a per-province breakdown.
* `party_comparison_stats.json`: for each target number, the average
  party-list votes of that party where it was the twin and where it was not.
* `nationwide_party_stats.json`: per-party nationwide PL and MP totals, and
  the three groups A (lucky numbers), B (excluded) and C (16 and above).

The documents are UTF-8 and keep non-ASCII text as is. Running twice on the
same input produces byte-identical files.

## Running `twinaudit`

```text
twinaudit --mp-dir data/mp --pl-dir data/pl -p docs/data/common-data.json -o data
twinaudit -c audit.json --mode nationwide
twinaudit -c audit.json -r expected/anomaly_report.json
```

The configuration file holds the same settings under `inputSettings`
(`mpDirectory`, `plDirectory`, `provinceFile`), `outputSettings`
(`outputDirectory`), `rules` (the table above) and `mode`. Flags win over
the file. Relative paths in the file are relative to the file itself.

A missing input directory stops the run before anything is written. A
result document that cannot be read only skips its area. With `--reference`,
the run fails when the anomaly report differs from the given file, after
printing the differences. Set `RUST_LOG` or pass `--verbose` for more logs.

*/
