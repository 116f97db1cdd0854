// Built-in correctness suite and load-mode request builders

use crate::verdict::validate_cases;
use anyhow::{Context, Result};
use harness_common::types::{JobRequest, Language, TestCase};
use std::fs;
use std::path::Path;

const CPP_HELLO: &str = "#include <iostream>\nint main(){ std::cout<<\"Hello CPP\"; }";

const CPP_UNDECLARED: &str = "#include <iostream>\nint main(){ std::cout << x; }";

const PY_DIV_ZERO: &str = "x = 5\ny = 0\nprint(x / y)";

const PY_HEAVY_LOOP: &str = "s=0\nfor i in range(10_000_000): s+=i\nprint(s)";

const JS_BFS: &str = r#"
function bfs(graph, start) {
  let visited = new Set();
  let queue = [start];
  visited.add(start);

  while (queue.length > 0) {
    let node = queue.shift();
    for (let nei of graph[node] || []) {
      if (!visited.has(nei)) {
        visited.add(nei);
        queue.push(nei);
      }
    }
  }
  return visited.size;
}

const N = 2000;
let graph = {};
for (let i = 1; i <= N; i++) graph[i] = [];

for (let i = 1; i <= N; i++) {
  for (let j = 0; j < 3; j++) {
    let to = Math.floor(Math.random() * N) + 1;
    if (to !== i) graph[i].push(to);
  }
}

let reachable = bfs(graph, 1);
console.log("Reachable:", reachable);
"#;

const JS_REFERENCE_ERROR: &str = "console.log(x + 1);";

const GO_PANIC: &str = r#"package main
import "fmt"

func main() {
    var x []int
    fmt.Println(x[10])
}"#;

const GO_SUM: &str = r#"package main
import "fmt"

func main() {
  sum := 0
  for i:=1; i<=10; i++ { sum+=i }
  fmt.Println(sum)
}"#;

const JAVA_DIJKSTRA: &str = r#"import java.util.*;

public class Main {
  static class P { int v; long w; P(int v,long w){this.v=v;this.w=w;} }
  public static void main(String[] a){
    Scanner sc=new Scanner(System.in);
    int N=sc.nextInt(), M=sc.nextInt();
    List<List<P>> g = new ArrayList<>();
    for(int i=0;i<=N;i++) g.add(new ArrayList<>());
    for(int i=0;i<M;i++){
      int u=sc.nextInt(), v=sc.nextInt(); long w=sc.nextLong();
      g.get(u).add(new P(v,w));
      g.get(v).add(new P(u,w));
    }
    long[] d=new long[N+1];
    Arrays.fill(d, Long.MAX_VALUE);
    PriorityQueue<long[]> pq=new PriorityQueue<>(Comparator.comparingLong(x->x[1]));
    d[1]=0;
    pq.add(new long[]{1,0});
    while(!pq.isEmpty()){
      long[] cur=pq.poll();
      int node=(int)cur[0];
      if(cur[1]!=d[node]) continue;
      for(P nx:g.get(node)){
        if(d[nx.v]>cur[1]+nx.w){
          d[nx.v]=cur[1]+nx.w;
          pq.add(new long[]{nx.v,d[nx.v]});
        }
      }
    }
    for(int i=1;i<=N;i++) System.out.print(d[i]+" ");
  }
}"#;

const JAVA_DIJKSTRA_INPUT: &str = "5 6\n1 2 3\n1 3 4\n2 3 2\n2 4 7\n3 5 1\n4 5 2\n";

/// The fixed cases, in the order they run
pub fn builtin_cases() -> Vec<TestCase> {
    vec![
        TestCase::exact(
            "CPP: Hello World",
            JobRequest::new(Language::Cpp, CPP_HELLO, ""),
            "Hello CPP",
        ),
        TestCase::error(
            "CPP: Compilation Error",
            JobRequest::new(Language::Cpp, CPP_UNDECLARED, ""),
            "CompilationError",
        ),
        TestCase::error(
            "Python: Runtime Error (division by zero)",
            JobRequest::new(Language::Python, PY_DIV_ZERO, ""),
            "RuntimeError",
        ),
        TestCase::exact(
            "Python: Heavy Loop",
            JobRequest::new(Language::Python, PY_HEAVY_LOOP, ""),
            "49999995000000",
        ),
        TestCase::contains(
            "JS: BFS Traversal + Heavy Load",
            JobRequest::new(Language::Javascript, JS_BFS, ""),
            "Reachable:",
        ),
        TestCase::error(
            "JS: ReferenceError",
            JobRequest::new(Language::Javascript, JS_REFERENCE_ERROR, ""),
            "RuntimeError",
        ),
        TestCase::error(
            "Go: Panic Test",
            JobRequest::new(Language::Go, GO_PANIC, ""),
            "RuntimeError",
        ),
        TestCase::exact(
            "Go: Normal Program",
            JobRequest::new(Language::Go, GO_SUM, ""),
            "55",
        ),
        TestCase::contains(
            "Java: Dijkstra Shortest Path",
            JobRequest::new(Language::Java, JAVA_DIJKSTRA, JAVA_DIJKSTRA_INPUT),
            "0",
        ),
    ]
}

/// Load a suite from a JSON array of cases, rejecting any case without
/// exactly one expectation
pub fn load_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cases: Vec<TestCase> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    validate_cases(&cases)?;
    Ok(cases)
}

/// `count` copies of one request
pub fn repeated_requests(template: &JobRequest, count: usize) -> Vec<JobRequest> {
    vec![template.clone(); count]
}

/// `count` requests cycling through the built-in suite bodies
pub fn mixed_requests(count: usize) -> Vec<JobRequest> {
    builtin_cases()
        .into_iter()
        .map(|case| case.body)
        .cycle()
        .take(count)
        .collect()
}

/// The default load job: `print(1)` in Python
pub fn default_load_request() -> JobRequest {
    JobRequest::new(Language::Python, "print(1)", "")
}
